use crate::{handlers::*, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Datasets
        .route("/api/datasets", post(import_dataset).get(list_datasets))
        .route(
            "/api/datasets/:id",
            get(get_dataset).delete(delete_dataset),
        )
        .route("/api/datasets/:id/scrape", post(start_scrape))
        .route("/api/datasets/:id/upload", post(start_upload))
        .route("/api/datasets/:id/csv", get(download_csv))
        // Shop products
        .route("/api/products/:id/price", put(update_price))
        .route("/api/products/:id/status", put(update_status))
        // Upload history
        .route("/api/uploads", get(list_uploads))
        // Health and metrics
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(console)
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
