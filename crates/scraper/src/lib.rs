pub mod deloox;

pub use deloox::DelooxClient;

use async_trait::async_trait;
use gtin_sync_models::{ScrapeResult, SyncError};
use tracing::{debug, warn};

/// Description and image found on a product page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetails {
    pub description: String,
    pub image_url: Option<String>,
}

/// A site that can be searched by GTIN for product pages.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// URL of the product page for `gtin`, if the site knows the product.
    async fn find_product_link(&self, gtin: &str) -> Result<Option<String>, SyncError>;

    async fn fetch_product_details(&self, url: &str) -> Result<ProductDetails, SyncError>;

    /// Search and page fetch combined. Never fails: errors end up as the
    /// result's warning with the affected fields left empty.
    async fn lookup(&self, gtin: &str) -> ScrapeResult {
        let link = match self.find_product_link(gtin).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!(gtin = %gtin, "no product found");
                return ScrapeResult::default();
            }
            Err(e) => {
                warn!(gtin = %gtin, error = %e, "product search failed");
                return ScrapeResult {
                    warning: Some(format!("Error fetching data for GTIN {gtin}: {e}")),
                    ..Default::default()
                };
            }
        };

        match self.fetch_product_details(&link).await {
            Ok(details) => ScrapeResult {
                link: Some(link),
                description: Some(details.description),
                image_url: details.image_url,
                warning: None,
            },
            Err(e) => {
                warn!(gtin = %gtin, url = %link, error = %e, "product page fetch failed");
                ScrapeResult {
                    warning: Some(format!(
                        "Error fetching product details for URL {link}: {e}"
                    )),
                    link: Some(link),
                    description: None,
                    image_url: None,
                }
            }
        }
    }
}
