use crate::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopifyCredentials {
    pub shop_url: String,
    pub api_version: String,
    pub api_token: String,
}

impl fmt::Debug for ShopifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyCredentials")
            .field("shop_url", &self.shop_url)
            .field("api_version", &self.api_version)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl ShopifyCredentials {
    /// Overlay request-supplied values; blank fields fall back to `self`.
    pub fn with_overrides(&self, overrides: Option<&CredentialsOverride>) -> Self {
        let Some(o) = overrides else {
            return self.clone();
        };
        let pick = |value: &Option<String>, fallback: &String| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| fallback.clone())
        };
        Self {
            shop_url: pick(&o.shop_url, &self.shop_url),
            api_version: pick(&o.api_version, &self.api_version),
            api_token: pick(&o.api_token, &self.api_token),
        }
    }

    pub fn ensure_complete(&self) -> Result<(), SyncError> {
        let mut fields = Vec::new();
        if self.shop_url.trim().is_empty() {
            fields.push("shop_url");
        }
        if self.api_version.trim().is_empty() {
            fields.push("api_version");
        }
        if self.api_token.trim().is_empty() {
            fields.push("api_token");
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(SyncError::MissingCredentials { fields })
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CredentialsOverride {
    pub shop_url: Option<String>,
    pub api_version: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Draft => write!(f, "draft"),
            ProductStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(format!("Invalid product status: {other}")),
        }
    }
}

// Request/Response types for API

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadRequest {
    pub credentials: Option<CredentialsOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePriceRequest {
    pub price: f64,
    pub credentials: Option<CredentialsOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: Option<ProductStatus>,
    pub credentials: Option<CredentialsOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}
