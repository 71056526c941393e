//! Product operations composed from the storefront primitives.

use crate::types::{NewImage, NewProduct, NewVariant};
use crate::Storefront;
use gtin_sync_catalog::format_price;
use gtin_sync_models::{ProductRow, ProductStatus, SyncError};
use tracing::{info, instrument};

/// Shop listing for a scraped sheet row.
pub fn new_product_for(row: &ProductRow, title_prefix: &str) -> NewProduct {
    NewProduct {
        title: format!("{title_prefix}{}", row.name),
        body_html: row.description().to_string(),
        status: ProductStatus::Active,
        variants: vec![NewVariant {
            price: format_price(row.selling_price.unwrap_or(0.0)),
            sku: row.gtin.clone(),
            inventory_management: "shopify".to_string(),
        }],
        images: row
            .image_url()
            .map(|src| vec![NewImage { src: src.to_string() }])
            .unwrap_or_default(),
    }
}

/// Creates the product and stocks its first variant at `location_id`.
/// Returns the new product id.
#[instrument(skip(store, product), fields(title = %product.title))]
pub async fn publish_listing(
    store: &dyn Storefront,
    product: &NewProduct,
    location_id: u64,
    available: i64,
) -> Result<u64, SyncError> {
    let created = store.create_product(product).await?;
    let inventory_item_id = created
        .variants
        .first()
        .and_then(|v| v.inventory_item_id)
        .ok_or_else(|| SyncError::InventoryNotSet {
            product_id: created.id,
            reason: "response carried no inventory item".to_string(),
        })?;

    store
        .set_inventory(location_id, inventory_item_id, available)
        .await
        .map_err(|e| SyncError::InventoryNotSet {
            product_id: created.id,
            reason: e.to_string(),
        })?;
    Ok(created.id)
}

/// Sets the price of every variant of a product.
pub async fn update_product_price(
    store: &dyn Storefront,
    product_id: u64,
    new_price: f64,
) -> Result<String, SyncError> {
    if !(new_price.is_finite() && new_price >= 0.0) {
        return Err(SyncError::InvalidRequest {
            reason: format!("price must be a non-negative number, got {new_price}"),
        });
    }
    let product = store
        .get_product(product_id)
        .await?
        .ok_or(SyncError::ProductNotFound { product_id })?;

    let price = format_price(new_price);
    for variant in &product.variants {
        store.update_variant_price(variant.id, &price).await?;
    }
    info!(product_id, price = %price, variants = product.variants.len(), "price updated");
    Ok(format!(
        "Price updated successfully to {price} for product ID {product_id}."
    ))
}

/// Moves a product out of the storefront, by default to `draft`.
pub async fn deactivate_product(
    store: &dyn Storefront,
    product_id: u64,
    status: ProductStatus,
) -> Result<String, SyncError> {
    store.set_product_status(product_id, status).await?;
    info!(product_id, status = %status, "product status changed");
    Ok(format!(
        "Product ID {product_id} has been set to status '{status}'."
    ))
}
