//! GTIN Sync: look up products by GTIN on Deloox and publish them to a
//! Shopify store. This crate wires the workspace crates into a server.

pub use gtin_sync_api as api;
pub use gtin_sync_control as control;
pub use gtin_sync_models as models;

use gtin_sync_api::AppState;
use gtin_sync_control::SyncService;
use gtin_sync_metrics::MetricsService;
use gtin_sync_models::{Config, SyncError};
use gtin_sync_scraper::DelooxClient;
use gtin_sync_shopify::ShopifyConnector;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Opens the SQLite database, creating the file and its directory when
/// they do not exist yet.
pub async fn connect_database(db_url: &str) -> Result<SqlitePool, SyncError> {
    let in_memory = db_url.contains(":memory:");
    if !in_memory {
        let path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("Failed to create DB parent directory {:?}: {}", parent, e);
                }
            }
        }
    }

    let options = SqliteConnectOptions::from_str(db_url)
        .map_err(|e| SyncError::DatabaseError {
            reason: format!("invalid database URL {db_url}: {e}"),
        })?
        .create_if_missing(true);

    // An in-memory database lives per connection, so it gets exactly one.
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .connect_with(options)
        .await
        .map_err(SyncError::SqlxError)?;
    info!("Database connected");
    Ok(pool)
}

/// Builds everything the HTTP layer needs from a loaded configuration.
pub async fn build_state(config: Config) -> Result<AppState, SyncError> {
    let config = Arc::new(config);
    let pool = connect_database(&config.data.db_url).await?;
    let metrics = Arc::new(MetricsService::new()?);
    let source = Arc::new(DelooxClient::new(&config.scraper)?);
    let connector = Arc::new(ShopifyConnector::new(Duration::from_millis(
        config.shopify.timeout_ms,
    )));

    let service = SyncService::new(pool, source, connector, metrics.clone(), config.clone()).await?;
    Ok(AppState::new(config, Arc::new(service), metrics))
}
