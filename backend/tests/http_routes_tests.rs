//! HTTP endpoint tests driving the axum router directly.
#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sfp_rust::db::repositories::LocalRepository;
use sfp_rust::db::repository::FullRepository;
use sfp_rust::http::{create_router, AppState};

fn app() -> Router {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    create_router(AppState::new(repo))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn upload_site(app: &Router, name: &str, spike: Option<usize>) -> i64 {
    let (status, body) = send(
        app,
        post_json(
            "/datasets",
            json!({"file_name": name, "csv": support::site_csv(72, spike)}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["repository"], "connected");
}

#[tokio::test]
async fn test_upload_and_list() {
    let app = app();
    let id = upload_site(&app, "site.csv", None).await;

    // same content again is reported as a duplicate with 200
    let (status, body) = send(
        &app,
        post_json(
            "/datasets",
            json!({"file_name": "site.csv", "csv": support::site_csv(72, None)}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duplicate"], true);
    assert_eq!(body["data_id"], id);

    let (status, body) = send(&app, get("/datasets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["datasets"][0]["file_name"], "site.csv");
    assert_eq!(body["datasets"][0]["rows"], 72);
}

#[tokio::test]
async fn test_upload_missing_column_is_400() {
    let (status, body) = send(
        &app(),
        post_json(
            "/datasets",
            json!({"file_name": "bad.csv", "csv": "timestamp,GI,TM\n2024-01-01 00:00,1,2\n"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("EAC"));
}

#[tokio::test]
async fn test_visualize_raw_only() {
    let app = app();
    let id = upload_site(&app, "site.csv", None).await;

    let (status, body) = send(&app, get(&format!("/visualize?data_id={}", id))).await;
    assert_eq!(status, StatusCode::OK);
    let stages = &body["stages"];
    assert_eq!(stages["raw"]["rows"], 72);
    assert_eq!(stages["gi_tm_adjusted"]["rows"], 72);
    assert_eq!(stages["outlier_removed"]["rows"], 72);
    assert_eq!(body["outlier_mask"].as_array().unwrap().len(), 72);
    assert_eq!(
        stages["raw"]["boxplot_by_hour"].as_object().unwrap().len(),
        24
    );
    assert_eq!(
        stages["raw"]["boxplot_by_month"].as_object().unwrap().len(),
        12
    );
    assert!(stages["raw"]["scatter_matrix"]["pairs"]["EAC__GI"].is_object());
    assert_eq!(
        stages["raw"]["correlation_heatmap_full"]["matrix"][0][0],
        1.0
    );
    assert_eq!(body["sample"].as_array().unwrap().len(), 20);
    assert_eq!(body["metadata"]["irradiance_unit"], "kWh/m²");
}

#[tokio::test]
async fn test_visualize_legacy_remove_outliers() {
    let app = app();
    let id = upload_site(&app, "site.csv", Some(12)).await;

    let (status, body) = send(
        &app,
        get(&format!(
            "/visualize/site-data?data_id={}&remove_outliers=true&outlier_method=iqr&iqr_factor=1.5",
            id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let adjusted = body["stages"]["gi_tm_adjusted"]["rows"].as_u64().unwrap();
    let removed = body["stages"]["outlier_removed"]["rows"].as_u64().unwrap();
    let flagged = body["outlier_mask"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m.as_bool() == Some(true))
        .count() as u64;
    assert_eq!(adjusted, 39);
    assert!(flagged >= 1);
    assert_eq!(removed + flagged, adjusted);
    assert_eq!(body["metadata"]["policy"]["method"], "iqr");
}

#[tokio::test]
async fn test_visualize_ordering_error_is_400() {
    let app = app();
    let id = upload_site(&app, "site.csv", None).await;
    let (status, body) = send(
        &app,
        get(&format!(
            "/visualize?data_id={}&apply_gi_tm=false&apply_outlier=true",
            id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "STAGE_ORDER");
    assert!(body["message"].as_str().unwrap().contains("gi_tm_adjusted"));
}

#[tokio::test]
async fn test_visualize_oversized_bins_is_400() {
    let app = app();
    let id = upload_site(&app, "site.csv", None).await;
    for bins in ["1000000000", "18446744073709551615"] {
        let (status, body) = send(
            &app,
            get(&format!("/visualize?data_id={}&bins={}", id, bins)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["message"].as_str().unwrap().contains("bins"));
    }
}

#[tokio::test]
async fn test_visualize_unknown_dataset_is_404() {
    let (status, body) = send(&app(), get("/visualize?data_id=404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_save_cleaned_data() {
    let app = app();
    let source = upload_site(&app, "site.csv", Some(12)).await;

    let (status, body) = send(
        &app,
        post_json(
            "/save-cleaned-data",
            json!({"file_name": "site.csv", "apply_outlier": true, "outlier_method": "iqr", "iqr_factor": 1.5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["new_file_name"], "cleaned_site.csv");
    let kept = body["rows_after_cleaning"].as_u64().unwrap();
    assert!(kept < 39);
    assert_eq!(kept + body["removed_rows"].as_u64().unwrap(), 72);

    let (_, listing) = send(&app, get("/datasets")).await;
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["datasets"][1]["derived_from"], source);
}

#[tokio::test]
async fn test_convert_irradiance() {
    let app = app();
    upload_site(&app, "site.csv", None).await;

    let (status, body) = send(
        &app,
        post_json(
            "/units/irradiance/convert",
            json!({"from_unit": "Wh/m²", "file_name": "site.csv"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to_unit"], "kWh/m²");
    assert_eq!(body["factor_to_kwh"], 0.001);
    // first record is midnight with GI = 0
    assert_eq!(body["preview_original"], 0.0);
    assert_eq!(body["preview_converted"], 0.0);

    let (status, _) = send(
        &app,
        post_json("/units/irradiance/convert", json!({"file_name": "site.csv"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/units/irradiance/convert",
            json!({"from_unit": "MJ/m²", "file_name": "missing.csv"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
