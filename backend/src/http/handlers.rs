//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::error::AppError;
use super::state::AppState;
use crate::api::{
    ConvertRequest, ConvertResponse, DatasetListResponse, HealthResponse, SaveCleanedRequest,
    SaveCleanedResponse, UploadDatasetRequest, UploadDatasetResponse, VisualizeData,
    VisualizeQuery,
};
use crate::db::services as db_services;
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        repository,
    }))
}

// =============================================================================
// Datasets
// =============================================================================

/// GET /datasets
pub async fn list_datasets(State(state): State<AppState>) -> HandlerResult<DatasetListResponse> {
    let datasets = db_services::list_datasets(state.repository.as_ref()).await?;
    let total = datasets.len();
    Ok(Json(DatasetListResponse { datasets, total }))
}

/// POST /datasets
///
/// Returns 201 for a new dataset and 200 when identical content was
/// already stored.
pub async fn upload_dataset(
    State(state): State<AppState>,
    Json(request): Json<UploadDatasetRequest>,
) -> Result<(StatusCode, Json<UploadDatasetResponse>), AppError> {
    let response = services::ingest_upload(state.repository.as_ref(), request).await?;
    let status = if response.duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

// =============================================================================
// Cleaning pipeline
// =============================================================================

/// GET /visualize and GET /visualize/site-data
pub async fn visualize(
    State(state): State<AppState>,
    Query(query): Query<VisualizeQuery>,
) -> HandlerResult<VisualizeData> {
    let data = services::get_visualize_data(
        state.repository.as_ref(),
        query,
        &state.config.pipeline,
    )
    .await?;
    Ok(Json(data))
}

/// POST /save-cleaned-data
pub async fn save_cleaned_data(
    State(state): State<AppState>,
    Json(request): Json<SaveCleanedRequest>,
) -> HandlerResult<SaveCleanedResponse> {
    let response =
        services::save_cleaned_data(state.repository.as_ref(), request, &state.config.pipeline)
            .await?;
    Ok(Json(response))
}

/// POST /units/irradiance/convert
pub async fn convert_irradiance(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> HandlerResult<ConvertResponse> {
    let response = services::convert_irradiance(state.repository.as_ref(), request).await?;
    Ok(Json(response))
}
