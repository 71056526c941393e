#![allow(dead_code)]

use gtin_sync_control::SyncService;
use gtin_sync_metrics::MetricsService;
use gtin_sync_models::{Config, ShopifyCredentials, SyncError};
use async_trait::async_trait;
use gtin_sync_scraper::{DelooxClient, ProductDetails, ProductSource};
use gtin_sync_shopify::{ShopifyConnector, Storefront, StorefrontConnector};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub async fn memory_pool() -> sqlx::SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

pub async fn service_with(
    config: Config,
    connector: Arc<dyn StorefrontConnector>,
) -> Arc<SyncService> {
    let source = Arc::new(DelooxClient::new(&config.scraper).unwrap());
    service_from(config, source, connector).await
}

pub async fn service_from(
    config: Config,
    source: Arc<dyn ProductSource>,
    connector: Arc<dyn StorefrontConnector>,
) -> Arc<SyncService> {
    let metrics = Arc::new(MetricsService::new().unwrap());
    Arc::new(
        SyncService::new(memory_pool().await, source, connector, metrics, Arc::new(config))
            .await
            .unwrap(),
    )
}

pub async fn service(config: Config) -> Arc<SyncService> {
    let connector = Arc::new(ShopifyConnector::new(Duration::from_secs(2)));
    service_with(config, connector).await
}

/// A connector that cannot reach any shop.
pub struct UnreachableShop;

impl StorefrontConnector for UnreachableShop {
    fn connect(&self, _: &ShopifyCredentials) -> Result<Arc<dyn Storefront>, SyncError> {
        Err(SyncError::ShopifyTransport {
            reason: "connection refused".to_string(),
        })
    }
}

/// A product source that knows no products and remembers when it was asked.
#[derive(Default)]
pub struct RecordingSource {
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl RecordingSource {
    pub fn calls(&self) -> Vec<(String, tokio::time::Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductSource for RecordingSource {
    async fn find_product_link(&self, gtin: &str) -> Result<Option<String>, SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push((gtin.to_string(), tokio::time::Instant::now()));
        Ok(None)
    }

    async fn fetch_product_details(&self, _url: &str) -> Result<ProductDetails, SyncError> {
        Ok(ProductDetails::default())
    }
}
