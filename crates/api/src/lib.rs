pub mod handlers;
pub mod routes;
pub mod state;

pub use handlers::*;
pub use routes::*;
pub use state::*;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use rust_embed::RustEmbed;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(RustEmbed)]
#[folder = "../../console"]
struct Assets;

pub(crate) fn embedded_file_response(path: &str) -> impl IntoResponse {
    let key = if path.is_empty() { "index.html" } else { path };

    // Anything without an extension is a console route and gets the page.
    let is_static_file = key.contains('.') && !key.ends_with(".html");

    let bytes = if is_static_file {
        Assets::get(key).or_else(|| Assets::get("index.html"))
    } else {
        Assets::get("index.html")
    };

    if let Some(content) = bytes {
        let body = axum::body::Body::from(content.data.into_owned());
        let mime = if is_static_file {
            mime_guess::from_path(key).first_or_octet_stream()
        } else {
            mime_guess::from_path("index.html").first_or_octet_stream()
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_str(mime.as_ref()).unwrap_or(HeaderValue::from_static("text/html")),
        );
        (StatusCode::OK, headers, body).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            axum::body::Body::empty(),
        )
            .into_response()
    }
}

/// The full application: API routes, console and the shared layers.
pub fn build_app(state: AppState) -> Router {
    let body_size_limit = (state.config.server.max_upload_size_mb * 1024 * 1024) as usize;

    Router::new().merge(build_router(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(body_size_limit)),
    )
}

/// Serves on an already bound listener until the future is dropped.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("GTIN Sync server listening on {}", addr);
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}

pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(format!(
        "{}:{}",
        state.config.server.bind, state.config.server.port
    ))
    .await?;
    serve(listener, state).await
}
