use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/search", get(search_products))
        .route("/barcode/:code", get(get_by_barcode))
        .route("/:id", get(get_product))
        .route("/:id/alternatives", get(get_alternatives))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let items = services.catalog().list_all();
    (StatusCode::OK, Json(dto::ProductList::new(items))).into_response()
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let items = services.catalog().search(&query.q);
    (StatusCode::OK, Json(dto::ProductList::new(items))).into_response()
}

pub async fn get_by_barcode(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.catalog().get_by_barcode(&code) {
        Some(product) => (StatusCode::OK, Json(product)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no product with barcode {code}")),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalog().get(&product_id) {
        Some(product) => (StatusCode::OK, Json(product)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
    }
}

pub async fn get_alternatives(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if services.catalog().get(&product_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found");
    }
    let items = services.catalog().alternatives_for(&product_id);
    (StatusCode::OK, Json(dto::ProductList::new(items))).into_response()
}
