use crate::{embedded_file_response, AppState};
use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use gtin_sync_models::{
    DatasetView, ErrorShape, ListDatasetsResponse, ListUploadsResponse, MessageResponse,
    SyncError, UpdatePriceRequest, UpdateStatusRequest, UploadRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub type ApiError = (StatusCode, Json<ErrorShape>);

fn api_error(e: SyncError) -> ApiError {
    let error_shape = e.to_error_shape();
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(error_shape),
    )
}

fn invalid_request(reason: String) -> ApiError {
    api_error(SyncError::InvalidRequest { reason })
}

fn is_blank(body: &Bytes) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Parses an optional JSON body. An empty body yields the type's default.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if is_blank(body) {
        return Ok(T::default());
    }
    required_json(body)
}

fn required_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if is_blank(body) {
        return Err(invalid_request("request body is required".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| invalid_request(format!("invalid JSON body: {e}")))
}

fn path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    param
        .map(|Path(value)| value)
        .map_err(|e| invalid_request(e.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|e| invalid_request(e.body_text()))
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    pub file_name: Option<String>,
}

#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn import_dataset(
    State(state): State<AppState>,
    params: Result<Query<ImportParams>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<DatasetView>), ApiError> {
    let params = query_params(params)?;
    match state.service.import_csv(&body, params.file_name) {
        Ok(view) => {
            info!("Imported dataset {} with {} rows", view.id, view.row_count);
            Ok((StatusCode::CREATED, Json(view)))
        }
        Err(e) => {
            error!("Failed to import dataset: {}", e);
            Err(api_error(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_datasets(State(state): State<AppState>) -> Json<ListDatasetsResponse> {
    Json(state.service.list_datasets())
}

#[instrument(skip(state))]
pub async fn get_dataset(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DatasetView>, ApiError> {
    let id = path_param(id)?;
    state.service.get_dataset(id).map(Json).map_err(api_error)
}

#[instrument(skip(state))]
pub async fn delete_dataset(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_param(id)?;
    match state.service.delete_dataset(id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete dataset {}: {}", id, e);
            Err(api_error(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn start_scrape(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<(StatusCode, Json<DatasetView>), ApiError> {
    let id = path_param(id)?;
    match state.service.spawn_scrape(id) {
        Ok(view) => Ok((StatusCode::ACCEPTED, Json(view))),
        Err(e) => {
            error!("Failed to start scrape of {}: {}", id, e);
            Err(api_error(e))
        }
    }
}

#[instrument(skip(state, body))]
pub async fn start_upload(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<DatasetView>), ApiError> {
    let id = path_param(id)?;
    let request: UploadRequest = optional_json(&body)?;
    match state.service.spawn_upload(id, request.credentials.as_ref()) {
        Ok(view) => Ok((StatusCode::ACCEPTED, Json(view))),
        Err(e) => {
            error!("Failed to start upload of {}: {}", id, e);
            Err(api_error(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn download_csv(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = path_param(id)?;
    let export = state.service.export_csv(id).map_err(api_error)?;
    let disposition = format!("attachment; filename=\"{}\"", export.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or(HeaderValue::from_static("attachment"));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

#[instrument(skip(state, body))]
pub async fn update_price(
    State(state): State<AppState>,
    product_id: Result<Path<u64>, PathRejection>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id = path_param(product_id)?;
    let payload: UpdatePriceRequest = required_json(&body)?;
    match state
        .service
        .update_product_price(product_id, payload.price, payload.credentials.as_ref())
        .await
    {
        Ok(message) => Ok(Json(message)),
        Err(e) => {
            error!("Failed to update price of product {}: {}", product_id, e);
            Err(api_error(e))
        }
    }
}

#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    product_id: Result<Path<u64>, PathRejection>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id = path_param(product_id)?;
    let request: UpdateStatusRequest = optional_json(&body)?;
    match state
        .service
        .deactivate_product(product_id, request.status, request.credentials.as_ref())
        .await
    {
        Ok(message) => Ok(Json(message)),
        Err(e) => {
            error!("Failed to change status of product {}: {}", product_id, e);
            Err(api_error(e))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadsQuery {
    pub dataset_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[instrument(skip(state))]
pub async fn list_uploads(
    State(state): State<AppState>,
    query: Result<Query<UploadsQuery>, QueryRejection>,
) -> Result<Json<ListUploadsResponse>, ApiError> {
    let query = query_params(query)?;
    state
        .service
        .list_uploads(query.dataset_id, query.limit)
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics.get_prometheus_metrics() {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            error!("Failed to get metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Serves the web console for any GET outside the API.
pub async fn console(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if method != Method::GET || path.starts_with("/api/") {
        let shape = ErrorShape {
            error_message: format!("No route for {method} {path}"),
            error_type: "ResourceNotFoundException".to_string(),
        };
        return (StatusCode::NOT_FOUND, Json(shape)).into_response();
    }
    embedded_file_response(path.trim_start_matches('/')).into_response()
}
