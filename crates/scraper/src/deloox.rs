//! Client for the deloox.se storefront.
//!
//! The search endpoint answers with an HTML suggestion popup; the first suggested
//! product links to a page carrying the description and the main product image.

use crate::{ProductDetails, ProductSource};
use async_trait::async_trait;
use gtin_sync_models::{ScraperConfig, SyncError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

struct Selectors {
    suggestions: Selector,
    suggested_product: Selector,
    description: Selector,
    image: Selector,
}

impl Selectors {
    fn new() -> Result<Self, SyncError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SyncError::ScraperError {
                reason: format!("invalid selector {css}: {e}"),
            })
        };
        Ok(Self {
            suggestions: parse("div.c-suggest-popular.dx_suggest-products")?,
            suggested_product: parse("a.c-option.suggested-product")?,
            description: parse("div#dx-description-container")?,
            image: parse("div.dx_product-image__container img")?,
        })
    }
}

pub struct DelooxClient {
    http: reqwest::Client,
    base_url: Url,
    selectors: Selectors,
}

impl DelooxClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, SyncError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| SyncError::ConfigError {
            reason: format!("invalid scraper.base_url {}: {e}", config.base_url),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SyncError::ScraperError {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            selectors: Selectors::new()?,
        })
    }

    pub fn search_url(&self, gtin: &str) -> Result<Url, SyncError> {
        let mut url = self
            .base_url
            .join("/api/search")
            .map_err(|e| SyncError::ScraperError {
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("keyword", gtin);
        Ok(url)
    }

    async fn get_html(&self, url: Url) -> Result<String, SyncError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::ScraperError {
                reason: e.to_string(),
            })?;
        response.text().await.map_err(|e| SyncError::ScraperError {
            reason: e.to_string(),
        })
    }

    /// First suggested product in a search popup, resolved against the site root.
    pub fn extract_product_link(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let container = document.select(&self.selectors.suggestions).next()?;
        let anchor = container.select(&self.selectors.suggested_product).next()?;
        let href = anchor.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        match self.base_url.join(href) {
            Ok(url) => Some(url.to_string()),
            Err(_) => Some(href.to_string()),
        }
    }

    pub fn extract_details(&self, html: &str) -> ProductDetails {
        let document = Html::parse_document(html);
        let description = document
            .select(&self.selectors.description)
            .next()
            .map(|el| {
                el.text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<String>()
            })
            .unwrap_or_default();
        let image_url = document
            .select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);
        ProductDetails {
            description,
            image_url,
        }
    }
}

#[async_trait]
impl ProductSource for DelooxClient {
    #[instrument(skip(self))]
    async fn find_product_link(&self, gtin: &str) -> Result<Option<String>, SyncError> {
        let url = self.search_url(gtin)?;
        let html = self.get_html(url).await?;
        let link = self.extract_product_link(&html);
        debug!(?link, "search finished");
        Ok(link)
    }

    #[instrument(skip(self))]
    async fn fetch_product_details(&self, url: &str) -> Result<ProductDetails, SyncError> {
        let url = Url::parse(url).map_err(|e| SyncError::ScraperError {
            reason: format!("invalid product URL {url}: {e}"),
        })?;
        let html = self.get_html(url).await?;
        Ok(self.extract_details(&html))
    }
}
