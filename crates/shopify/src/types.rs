use gtin_sync_models::ProductStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub body_html: String,
    pub status: ProductStatus,
    pub variants: Vec<NewVariant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<NewImage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewVariant {
    pub price: String,
    pub sku: String,
    pub inventory_management: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewImage {
    pub src: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Variant {
    pub id: u64,
    #[serde(default)]
    pub inventory_item_id: Option<u64>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Location {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}
