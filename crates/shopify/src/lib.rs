pub mod client;
pub mod listing;
pub mod types;

pub use client::{ShopifyClient, ShopifyConnector};
pub use listing::{deactivate_product, new_product_for, publish_listing, update_product_price};
pub use types::*;

use async_trait::async_trait;
use gtin_sync_models::{ProductStatus, ShopifyCredentials, SyncError};
use std::sync::Arc;

/// The Admin API calls GTIN Sync needs from a shop.
#[async_trait]
pub trait Storefront: Send + Sync {
    async fn create_product(&self, product: &NewProduct) -> Result<Product, SyncError>;

    async fn locations(&self) -> Result<Vec<Location>, SyncError>;

    async fn set_inventory(
        &self,
        location_id: u64,
        inventory_item_id: u64,
        available: i64,
    ) -> Result<(), SyncError>;

    /// `Ok(None)` when the shop has no product with this id.
    async fn get_product(&self, id: u64) -> Result<Option<Product>, SyncError>;

    async fn update_variant_price(&self, variant_id: u64, price: &str) -> Result<(), SyncError>;

    async fn set_product_status(&self, id: u64, status: ProductStatus) -> Result<(), SyncError>;
}

pub trait StorefrontConnector: Send + Sync {
    fn connect(&self, credentials: &ShopifyCredentials) -> Result<Arc<dyn Storefront>, SyncError>;
}
