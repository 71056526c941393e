use gtin_sync_control::SyncService;
use gtin_sync_metrics::MetricsService;
use gtin_sync_models::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<SyncService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, service: Arc<SyncService>, metrics: Arc<MetricsService>) -> Self {
        Self {
            config,
            service,
            metrics,
        }
    }
}
