use crate::{ShopifyCredentials, SyncError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Mobile Safari user agent; Deloox serves the lightweight search markup to it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub shopify: ShopifyConfig,
    pub pricing: PricingConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_upload_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub request_delay_ms: u64,
    pub user_agent: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ShopifyConfig {
    pub shop_url: String,
    pub api_version: String,
    pub api_token: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    pub multiplier: f64,
    pub title_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub db_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8501,
                max_upload_size_mb: 20,
            },
            scraper: ScraperConfig {
                base_url: "https://www.deloox.se".to_string(),
                timeout_ms: 10_000,
                request_delay_ms: 1_000,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            shopify: ShopifyConfig {
                shop_url: "".to_string(),
                api_version: "2024-01".to_string(),
                api_token: "".to_string(),
                timeout_ms: 30_000,
            },
            pricing: PricingConfig {
                multiplier: 1.40,
                title_prefix: "Test ".to_string(),
            },
            data: DataConfig {
                db_url: "sqlite://data/gtin-sync.db".to_string(),
            },
            logging: LoggingConfig { json: false },
        }
    }
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop_url", &self.shop_url)
            .field("api_version", &self.api_version)
            .field("api_token", &redact(&self.api_token))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Layered configuration: defaults, then the TOML file, then `GTIN_SYNC_*`
    /// environment variables (`__` separates sections, e.g. `GTIN_SYNC_SERVER__PORT`).
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("GTIN_SYNC_").split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        let mut config: Config =
            Self::figment(path)
                .extract()
                .map_err(|e| SyncError::ConfigError {
                    reason: e.to_string(),
                })?;
        config.apply_shop_env();
        config.validate()?;
        Ok(config)
    }

    /// `SHOP_URL`, `API_VERSION` and `API_TOKEN` are honoured as-is so existing
    /// `.env` files keep working.
    fn apply_shop_env(&mut self) {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(v) = read("SHOP_URL") {
            self.shopify.shop_url = v;
        }
        if let Some(v) = read("API_VERSION") {
            self.shopify.api_version = v;
        }
        if let Some(v) = read("API_TOKEN") {
            self.shopify.api_token = v;
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if !(self.pricing.multiplier.is_finite() && self.pricing.multiplier > 0.0) {
            return Err(SyncError::ConfigError {
                reason: format!(
                    "pricing.multiplier must be a positive number, got {}",
                    self.pricing.multiplier
                ),
            });
        }
        if self.scraper.base_url.trim().is_empty() {
            return Err(SyncError::ConfigError {
                reason: "scraper.base_url must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> ShopifyCredentials {
        ShopifyCredentials {
            shop_url: self.shopify.shop_url.clone(),
            api_version: self.shopify.api_version.clone(),
            api_token: self.shopify.api_token.clone(),
        }
    }
}
