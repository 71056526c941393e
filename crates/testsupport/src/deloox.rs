use crate::server::{serve, MockServer};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct MockProduct {
    description: String,
    image_url: Option<String>,
    page_broken: bool,
}

#[derive(Debug, Default)]
struct DelooxState {
    products: HashMap<String, MockProduct>,
    broken_search: HashSet<String>,
    searches: Vec<String>,
}

/// Stand-in for deloox.se serving search popups and product pages.
#[derive(Clone, Default)]
pub struct DelooxMock {
    state: Arc<Mutex<DelooxState>>,
}

impl DelooxMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, gtin: &str, description: &str, image_url: Option<&str>) -> Self {
        self.lock().products.insert(
            gtin.to_string(),
            MockProduct {
                description: description.to_string(),
                image_url: image_url.map(str::to_string),
                page_broken: false,
            },
        );
        self
    }

    /// The product is found by search but its page answers 500.
    pub fn with_broken_page(self, gtin: &str) -> Self {
        self.lock().products.insert(
            gtin.to_string(),
            MockProduct {
                description: String::new(),
                image_url: None,
                page_broken: true,
            },
        );
        self
    }

    pub fn with_broken_search(self, gtin: &str) -> Self {
        self.lock().broken_search.insert(gtin.to_string());
        self
    }

    /// Keywords searched so far, in request order.
    pub fn searches(&self) -> Vec<String> {
        self.lock().searches.clone()
    }

    pub async fn start(&self) -> Result<MockServer> {
        let app = Router::new()
            .route("/api/search", get(search))
            .route("/product/:gtin", get(product_page))
            .with_state(self.clone());
        serve(app).await
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DelooxState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn search(
    State(mock): State<DelooxMock>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let keyword = params.get("keyword").cloned().unwrap_or_default();
    let mut state = mock.lock();
    state.searches.push(keyword.clone());

    if state.broken_search.contains(&keyword) {
        return (StatusCode::SERVICE_UNAVAILABLE, "search is down").into_response();
    }
    if state.products.contains_key(&keyword) {
        Html(format!(
            r#"<div class="c-suggest-popular dx_suggest-products">
                 <span>Populära produkter</span>
                 <a class="c-option suggested-product" href="/product/{keyword}">Product {keyword}</a>
               </div>"#
        ))
        .into_response()
    } else {
        Html(r#"<div class="c-suggest-empty">Inga träffar</div>"#.to_string()).into_response()
    }
}

async fn product_page(State(mock): State<DelooxMock>, Path(gtin): Path<String>) -> Response {
    let product = mock.lock().products.get(&gtin).cloned();
    match product {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(p) if p.page_broken => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some(p) => {
            let image = p
                .image_url
                .map(|src| {
                    format!(r#"<div class="dx_product-image__container"><img src="{src}"></div>"#)
                })
                .unwrap_or_default();
            Html(format!(
                r#"<html><body>
                     {image}
                     <div id="dx-description-container"><p> {} </p></div>
                   </body></html>"#,
                p.description
            ))
            .into_response()
        }
    }
}
