use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use gtin_sync_api::{create_router, AppState};
use gtin_sync_control::SyncService;
use gtin_sync_metrics::MetricsService;
use gtin_sync_models::{Config, DatasetView, ErrorShape};
use gtin_sync_scraper::DelooxClient;
use gtin_sync_shopify::ShopifyConnector;
use gtin_sync_testsupport::{sample_csv, test_config};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

async fn create_test_app_state(config: Config) -> AppState {
    let config = Arc::new(config);
    let metrics = Arc::new(MetricsService::new().unwrap());
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let service = SyncService::new(
        pool,
        Arc::new(DelooxClient::new(&config.scraper).unwrap()),
        Arc::new(ShopifyConnector::new(Duration::from_secs(1))),
        metrics.clone(),
        config.clone(),
    )
    .await
    .unwrap();
    AppState::new(config, Arc::new(service), metrics)
}

async fn app() -> Router {
    let state = create_test_app_state(test_config("http://127.0.0.1:9", "http://127.0.0.1:9")).await;
    create_router().with_state(state)
}

async fn body_bytes(res: axum::response::Response) -> Vec<u8> {
    to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn import(app: &Router, csv: String) -> DatasetView {
    let res = app
        .clone()
        .oneshot(
            Request::post("/api/datasets?file_name=products.csv")
                .body(Body::from(csv))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

#[tokio::test]
async fn health_endpoint_works() {
    let res = app()
        .await
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_bytes(res).await, b"OK");
}

#[tokio::test]
async fn metrics_endpoint_works() {
    let res = app()
        .await
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(text.contains("gtin_sync_rows_scraped_total"));
}

#[tokio::test]
async fn imported_dataset_can_be_listed_downloaded_and_deleted() {
    let app = app().await;
    let view = import(&app, sample_csv(&[("0123", "Hammer", "10", "3")])).await;
    assert_eq!(view.file_name.as_deref(), Some("products.csv"));
    assert_eq!(view.preview[0][0], "0123");

    let res = app
        .clone()
        .oneshot(Request::get("/api/datasets").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let listed: Value = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert_eq!(listed["datasets"].as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(
            Request::get(format!("/api/datasets/{}/csv", view.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"products.csv\""
    );
    let csv = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(csv.starts_with("GTIN,Name,Brand"));

    let res = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/datasets/{}", view.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(
            Request::get(format!("/api/datasets/{}", view.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let shape: ErrorShape = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert_eq!(shape.error_type, "ResourceNotFoundException");
}

#[tokio::test]
async fn sheet_without_required_columns_is_rejected() {
    let res = app()
        .await
        .oneshot(
            Request::post("/api/datasets")
                .body(Body::from("GTIN,Name\n1,Hammer\n"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let shape: ErrorShape = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert!(shape.error_message.starts_with("Missing columns"));
    assert!(shape.error_message.contains("Inventory"));
}

#[tokio::test]
async fn upload_before_scrape_conflicts() {
    let app = app().await;
    let view = import(&app, sample_csv(&[("0123", "Hammer", "10", "3")])).await;

    let res = app
        .oneshot(
            Request::post(format!("/api/datasets/{}/upload", view.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_upload_body_is_a_bad_request() {
    let app = app().await;
    let view = import(&app, sample_csv(&[("0123", "Hammer", "10", "3")])).await;

    let res = app
        .oneshot(
            Request::post(format!("/api/datasets/{}/upload", view.id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"credentials\": 5}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

async fn expect_invalid_request(app: &Router, request: Request<Body>) -> ErrorShape {
    let res = app.clone().oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let shape: ErrorShape = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert_eq!(shape.error_type, "InvalidParameterValueException");
    shape
}

#[tokio::test]
async fn malformed_price_update_answers_with_error_shape() {
    let app = app().await;

    let shape = expect_invalid_request(
        &app,
        Request::put("/api/products/42/price")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"price\":\"cheap\"}"))
            .unwrap(),
    )
    .await;
    assert!(shape.error_message.starts_with("invalid JSON body"));

    let shape = expect_invalid_request(
        &app,
        Request::put("/api/products/42/price")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(shape.error_message, "request body is required");
}

#[tokio::test]
async fn bad_path_and_query_parameters_answer_with_error_shape() {
    let app = app().await;

    expect_invalid_request(
        &app,
        Request::get("/api/datasets/not-a-uuid")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    expect_invalid_request(
        &app,
        Request::post("/api/datasets/not-a-uuid/scrape")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    expect_invalid_request(
        &app,
        Request::put("/api/products/abc/status")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    expect_invalid_request(
        &app,
        Request::get("/api/uploads?limit=many")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
}

#[tokio::test]
async fn status_change_without_token_reports_missing_credentials() {
    let mut config = test_config("http://127.0.0.1:9", "demo.myshopify.com");
    config.shopify.api_token = String::new();
    let app = create_router().with_state(create_test_app_state(config).await);

    let res = app
        .oneshot(
            Request::put("/api/products/42/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let shape: ErrorShape = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert!(shape.error_message.contains("api_token"));
}

#[tokio::test]
async fn console_is_served_for_other_paths() {
    let app = app().await;
    let res = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let res = app
        .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploads_start_empty() {
    let res = app()
        .await
        .oneshot(Request::get("/api/uploads?limit=5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(res).await).unwrap();
    assert_eq!(body["uploads"], serde_json::json!([]));
}
