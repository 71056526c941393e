use crate::types::{Location, NewProduct, Product};
use crate::{Storefront, StorefrontConnector};
use async_trait::async_trait;
use gtin_sync_models::{ProductStatus, ShopifyCredentials, SyncError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Client for the Shopify Admin REST API of one shop.
pub struct ShopifyClient {
    http: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct LocationsEnvelope {
    locations: Vec<Location>,
}

impl ShopifyClient {
    pub fn new(credentials: &ShopifyCredentials, timeout: Duration) -> Result<Self, SyncError> {
        credentials.ensure_complete()?;
        let base_url = admin_base_url(&credentials.shop_url, &credentials.api_version)?;

        let mut token =
            HeaderValue::from_str(credentials.api_token.trim()).map_err(|_| {
                SyncError::InvalidRequest {
                    reason: "api_token contains characters not allowed in a header".to_string(),
                }
            })?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(transport)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base_url.join(path).map_err(|e| SyncError::InternalError {
            reason: format!("bad Shopify endpoint {path}: {e}"),
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::ShopifyApi {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(transport)
    }
}

#[async_trait]
impl Storefront for ShopifyClient {
    #[instrument(skip(self, product), fields(title = %product.title))]
    async fn create_product(&self, product: &NewProduct) -> Result<Product, SyncError> {
        let url = self.endpoint("products.json")?;
        let created: ProductEnvelope = self
            .send_json(self.http.post(url).json(&json!({ "product": product })))
            .await?;
        debug!(product_id = created.product.id, "product created");
        Ok(created.product)
    }

    async fn locations(&self) -> Result<Vec<Location>, SyncError> {
        let url = self.endpoint("locations.json")?;
        let envelope: LocationsEnvelope = self.send_json(self.http.get(url)).await?;
        Ok(envelope.locations)
    }

    #[instrument(skip(self))]
    async fn set_inventory(
        &self,
        location_id: u64,
        inventory_item_id: u64,
        available: i64,
    ) -> Result<(), SyncError> {
        let url = self.endpoint("inventory_levels/set.json")?;
        let body = json!({
            "location_id": location_id,
            "inventory_item_id": inventory_item_id,
            "available": available,
        });
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn get_product(&self, id: u64) -> Result<Option<Product>, SyncError> {
        let url = self.endpoint(&format!("products/{id}.json"))?;
        match self.send_json::<ProductEnvelope>(self.http.get(url)).await {
            Ok(envelope) => Ok(Some(envelope.product)),
            Err(SyncError::ShopifyApi { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn update_variant_price(&self, variant_id: u64, price: &str) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("variants/{variant_id}.json"))?;
        let body = json!({ "variant": { "id": variant_id, "price": price } });
        self.send(self.http.put(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_product_status(&self, id: u64, status: ProductStatus) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("products/{id}.json"))?;
        let body = json!({ "product": { "id": id, "status": status } });
        match self.send(self.http.put(url).json(&body)).await {
            Ok(_) => Ok(()),
            Err(SyncError::ShopifyApi { status: 404, .. }) => {
                Err(SyncError::ProductNotFound { product_id: id })
            }
            Err(e) => Err(e),
        }
    }
}

/// Builds a [`ShopifyClient`] per set of credentials.
pub struct ShopifyConnector {
    timeout: Duration,
}

impl ShopifyConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl StorefrontConnector for ShopifyConnector {
    fn connect(&self, credentials: &ShopifyCredentials) -> Result<Arc<dyn Storefront>, SyncError> {
        Ok(Arc::new(ShopifyClient::new(credentials, self.timeout)?))
    }
}

/// `https://{shop}/admin/api/{version}/`. A shop URL with an explicit scheme is
/// kept as given.
pub fn admin_base_url(shop_url: &str, api_version: &str) -> Result<Url, SyncError> {
    let shop = shop_url.trim().trim_end_matches('/');
    let shop = if shop.starts_with("http://") || shop.starts_with("https://") {
        shop.to_string()
    } else {
        format!("https://{shop}")
    };
    let raw = format!("{shop}/admin/api/{}/", api_version.trim());
    Url::parse(&raw).map_err(|e| SyncError::InvalidRequest {
        reason: format!("invalid shop URL {shop_url}: {e}"),
    })
}

/// Flattens a Shopify `errors` payload into readable messages, e.g.
/// `{"errors": {"title": ["can't be blank"]}}` becomes `title can't be blank`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let errors = parsed
        .as_ref()
        .and_then(|v| v.get("errors").or_else(|| v.get("error")));

    let messages = match errors {
        Some(Value::String(message)) => vec![message.clone()],
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        Some(Value::Object(fields)) => fields
            .iter()
            .flat_map(|(field, value)| {
                let texts: Vec<String> = match value {
                    Value::Array(items) => items.iter().map(value_text).collect(),
                    other => vec![value_text(other)],
                };
                texts.into_iter().map(move |text| {
                    if field == "base" {
                        text
                    } else {
                        format!("{field} {text}")
                    }
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    if !messages.is_empty() {
        messages.join(", ")
    } else if !body.trim().is_empty() && parsed.is_none() {
        body.trim().to_string()
    } else {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::ShopifyTransport {
        reason: err.to_string(),
    }
}
