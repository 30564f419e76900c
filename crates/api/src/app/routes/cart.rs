use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_cart))
        .route("/scan", post(scan))
        .route("/clear", post(clear_cart))
        .route("/optimization", get(preview_optimization))
        .route("/optimize", post(optimize))
        .route("/:product_id", delete(remove_item))
        .route("/:product_id/swap", post(swap))
}

pub async fn get_cart(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    (StatusCode::OK, Json(services.cart())).into_response()
}

pub async fn scan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ScanRequest>,
) -> axum::response::Response {
    if body.barcode.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "barcode cannot be empty");
    }
    match services.scan(&body.barcode) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.remove_item(&product_id) {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn clear_cart(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    (StatusCode::OK, Json(services.clear_cart())).into_response()
}

pub async fn swap(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.swap(&product_id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn preview_optimization(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.optimization_preview() {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn optimize(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.optimize() {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
