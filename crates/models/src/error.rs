use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Dataset not found: {id}")]
    DatasetNotFound { id: Uuid },

    #[error("Missing columns: {columns:?}")]
    MissingColumns { columns: Vec<String> },

    #[error("Invalid value {value:?} in column '{column}' on line {line}")]
    InvalidRow {
        line: usize,
        column: String,
        value: String,
    },

    #[error("CSV file contains no product rows")]
    EmptyCsv,

    #[error("Unreadable CSV: {reason}")]
    InvalidCsv { reason: String },

    #[error("Dataset {id} is busy: {stage}")]
    DatasetBusy { id: Uuid, stage: String },

    #[error("Dataset {id} has not been scraped yet")]
    NotScraped { id: Uuid },

    #[error("Scraper error: {reason}")]
    ScraperError { reason: String },

    #[error("Shopify API error ({status}): {message}")]
    ShopifyApi { status: u16, message: String },

    #[error("Shopify request failed: {reason}")]
    ShopifyTransport { reason: String },

    #[error("Product with ID {product_id} not found.")]
    ProductNotFound { product_id: u64 },

    #[error("Missing Shopify credentials: {fields:?}")]
    MissingCredentials { fields: Vec<&'static str> },

    #[error("No locations found for inventory.")]
    NoLocations,

    #[error("Product {product_id} was created but its inventory could not be set: {reason}")]
    InventoryNotSet { product_id: u64, reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl SyncError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            SyncError::DatasetNotFound { .. } => "ResourceNotFoundException",
            SyncError::MissingColumns { .. } => "InvalidCsvException",
            SyncError::InvalidRow { .. } => "InvalidCsvException",
            SyncError::EmptyCsv => "InvalidCsvException",
            SyncError::InvalidCsv { .. } => "InvalidCsvException",
            SyncError::DatasetBusy { .. } => "ResourceConflictException",
            SyncError::NotScraped { .. } => "ResourceConflictException",
            SyncError::ScraperError { .. } => "ScraperException",
            SyncError::ShopifyApi { .. } => "ShopifyException",
            SyncError::ShopifyTransport { .. } => "ShopifyException",
            SyncError::ProductNotFound { .. } => "ResourceNotFoundException",
            SyncError::MissingCredentials { .. } => "InvalidParameterValueException",
            SyncError::NoLocations => "ShopifyException",
            SyncError::InventoryNotSet { .. } => "ShopifyException",
            SyncError::InvalidRequest { .. } => "InvalidParameterValueException",
            SyncError::ConfigError { .. } => "ServiceException",
            SyncError::DatabaseError { .. } => "ServiceException",
            SyncError::SqlxError(_) => "ServiceException",
            SyncError::InternalError { .. } => "ServiceException",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            SyncError::DatasetNotFound { .. } => 404,
            SyncError::MissingColumns { .. } => 400,
            SyncError::InvalidRow { .. } => 400,
            SyncError::EmptyCsv => 400,
            SyncError::InvalidCsv { .. } => 400,
            SyncError::DatasetBusy { .. } => 409,
            SyncError::NotScraped { .. } => 409,
            SyncError::ScraperError { .. } => 502,
            SyncError::ShopifyApi { .. } => 502,
            SyncError::ShopifyTransport { .. } => 502,
            SyncError::ProductNotFound { .. } => 404,
            SyncError::MissingCredentials { .. } => 400,
            SyncError::NoLocations => 502,
            SyncError::InventoryNotSet { .. } => 502,
            SyncError::InvalidRequest { .. } => 400,
            SyncError::ConfigError { .. } => 500,
            SyncError::DatabaseError { .. } => 500,
            SyncError::SqlxError(_) => 500,
            SyncError::InternalError { .. } => 500,
        }
    }
}
