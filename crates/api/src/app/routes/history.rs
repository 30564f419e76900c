use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(get_history))
}

pub async fn get_history(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.history().await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
