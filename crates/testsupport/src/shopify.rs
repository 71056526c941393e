use crate::server::{serve, MockServer};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct InventorySet {
    pub location_id: u64,
    pub inventory_item_id: u64,
    pub available: i64,
}

#[derive(Debug)]
struct ShopState {
    next_id: u64,
    products: BTreeMap<u64, Value>,
    locations: Vec<Value>,
    inventory: Vec<InventorySet>,
    rejected_titles: HashSet<String>,
    reject_inventory: bool,
    token: Option<String>,
}

/// In-memory Shopify Admin REST API covering the endpoints GTIN Sync calls.
#[derive(Clone)]
pub struct ShopifyMock {
    state: Arc<Mutex<ShopState>>,
}

impl Default for ShopifyMock {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopifyMock {
    /// A shop with a single location (id 5001) that accepts any token.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ShopState {
                next_id: 1000,
                products: BTreeMap::new(),
                locations: vec![json!({"id": 5001, "name": "Warehouse"})],
                inventory: Vec::new(),
                rejected_titles: HashSet::new(),
                reject_inventory: false,
                token: None,
            })),
        }
    }

    pub fn without_locations(self) -> Self {
        self.lock().locations.clear();
        self
    }

    /// Creating a product with this exact title fails with a 422.
    pub fn rejecting_title(self, title: &str) -> Self {
        self.lock().rejected_titles.insert(title.to_string());
        self
    }

    /// Every inventory update fails with a 422; products are still created.
    pub fn rejecting_inventory(self) -> Self {
        self.lock().reject_inventory = true;
        self
    }

    pub fn requiring_token(self, token: &str) -> Self {
        self.lock().token = Some(token.to_string());
        self
    }

    /// Seeds a product with one variant per price and returns its id.
    pub fn insert_product(&self, title: &str, prices: &[&str]) -> u64 {
        let mut state = self.lock();
        let id = state.next_id();
        let variants: Vec<Value> = prices
            .iter()
            .map(|price| {
                let variant_id = state.next_id();
                let item_id = state.next_id();
                json!({"id": variant_id, "product_id": id, "price": price, "inventory_item_id": item_id})
            })
            .collect();
        state.products.insert(
            id,
            json!({"id": id, "title": title, "status": "active", "variants": variants}),
        );
        id
    }

    pub fn product(&self, id: u64) -> Option<Value> {
        self.lock().products.get(&id).cloned()
    }

    pub fn products(&self) -> Vec<Value> {
        self.lock().products.values().cloned().collect()
    }

    pub fn inventory_sets(&self) -> Vec<InventorySet> {
        self.lock().inventory.clone()
    }

    pub async fn start(&self) -> Result<MockServer> {
        let app = Router::new()
            .route("/admin/api/:version/products.json", post(create_product))
            .route(
                "/admin/api/:version/products/:file",
                get(get_product).put(update_product),
            )
            .route("/admin/api/:version/variants/:file", put(update_variant))
            .route("/admin/api/:version/locations.json", get(list_locations))
            .route(
                "/admin/api/:version/inventory_levels/set.json",
                post(set_inventory),
            )
            .with_state(self.clone());
        serve(app).await
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_token(&self, headers: &HeaderMap) -> Result<(), Response> {
        let expected = self.lock().token.clone();
        let Some(expected) = expected else {
            return Ok(());
        };
        let given = headers
            .get("x-shopify-access-token")
            .and_then(|v| v.to_str().ok());
        if given == Some(expected.as_str()) {
            Ok(())
        } else {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"errors": "[API] Invalid API key or access token (unrecognized login or wrong password)"})),
            )
                .into_response())
        }
    }
}

impl ShopState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn parse_id(file: &str) -> Option<u64> {
    file.strip_suffix(".json")?.parse().ok()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"errors": "Not Found"}))).into_response()
}

async fn create_product(
    State(mock): State<ShopifyMock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    let mut product = body["product"].clone();
    let title = product["title"].as_str().unwrap_or_default().to_string();

    let mut state = mock.lock();
    if title.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": {"title": ["can't be blank"]}})),
        )
            .into_response();
    }
    if state.rejected_titles.contains(&title) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": {"title": ["is reserved"], "base": ["Product could not be saved"]}})),
        )
            .into_response();
    }

    let id = state.next_id();
    product["id"] = json!(id);
    if let Some(variants) = product["variants"].as_array_mut() {
        for variant in variants {
            variant["id"] = json!(state.next_id());
            variant["inventory_item_id"] = json!(state.next_id());
            variant["product_id"] = json!(id);
        }
    }
    if let Some(images) = product["images"].as_array_mut() {
        for image in images {
            image["id"] = json!(state.next_id());
        }
    }
    state.products.insert(id, product.clone());
    (StatusCode::CREATED, Json(json!({"product": product}))).into_response()
}

async fn get_product(
    State(mock): State<ShopifyMock>,
    headers: HeaderMap,
    Path((_version, file)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    let product = parse_id(&file).and_then(|id| mock.product(id));
    match product {
        Some(product) => Json(json!({"product": product})).into_response(),
        None => not_found(),
    }
}

async fn update_product(
    State(mock): State<ShopifyMock>,
    headers: HeaderMap,
    Path((_version, file)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    let Some(id) = parse_id(&file) else {
        return not_found();
    };
    let mut state = mock.lock();
    let Some(product) = state.products.get_mut(&id) else {
        return not_found();
    };
    if let Some(status) = body["product"]["status"].as_str() {
        if !["active", "draft", "archived"].contains(&status) {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"errors": {"status": ["is not included in the list"]}})),
            )
                .into_response();
        }
        product["status"] = json!(status);
    }
    Json(json!({"product": product.clone()})).into_response()
}

async fn update_variant(
    State(mock): State<ShopifyMock>,
    headers: HeaderMap,
    Path((_version, file)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    let Some(variant_id) = parse_id(&file) else {
        return not_found();
    };
    let price = body["variant"]["price"].clone();
    let mut state = mock.lock();
    for product in state.products.values_mut() {
        if let Some(variants) = product["variants"].as_array_mut() {
            for variant in variants {
                if variant["id"].as_u64() == Some(variant_id) {
                    variant["price"] = price;
                    return Json(json!({"variant": variant.clone()})).into_response();
                }
            }
        }
    }
    not_found()
}

async fn list_locations(State(mock): State<ShopifyMock>, headers: HeaderMap) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    let locations = mock.lock().locations.clone();
    Json(json!({"locations": locations})).into_response()
}

async fn set_inventory(
    State(mock): State<ShopifyMock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = mock.check_token(&headers) {
        return denied;
    }
    if mock.lock().reject_inventory {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": ["Inventory item does not have inventory tracking enabled"]})),
        )
            .into_response();
    }
    let set = InventorySet {
        location_id: body["location_id"].as_u64().unwrap_or_default(),
        inventory_item_id: body["inventory_item_id"].as_u64().unwrap_or_default(),
        available: body["available"].as_i64().unwrap_or_default(),
    };
    mock.lock().inventory.push(set.clone());
    Json(json!({"inventory_level": {
        "location_id": set.location_id,
        "inventory_item_id": set.inventory_item_id,
        "available": set.available,
    }}))
    .into_response()
}
