//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing) and creates
//! the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::routes::{cleaning, datasets, health, units, visualize};

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.body_limit_bytes();

    Router::new()
        .route(health::HEALTH_PATH, get(handlers::health_check))
        .route(
            datasets::DATASETS_PATH,
            get(handlers::list_datasets).post(handlers::upload_dataset),
        )
        .route(visualize::VISUALIZE_PATH, get(handlers::visualize))
        .route(visualize::VISUALIZE_SITE_DATA_PATH, get(handlers::visualize))
        .route(
            cleaning::SAVE_CLEANED_DATA_PATH,
            post(handlers::save_cleaned_data),
        )
        .route(
            units::CONVERT_IRRADIANCE_PATH,
            post(handlers::convert_irradiance),
        )
        // Site uploads can be large
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
