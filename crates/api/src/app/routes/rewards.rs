use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::dto::AwardBadgeRequest;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_rewards))
        .route("/redeem/:reward_id", post(redeem))
        .route("/badges", post(award_badge))
}

pub async fn get_rewards(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    (StatusCode::OK, Json(services.rewards())).into_response()
}

pub async fn redeem(
    Extension(services): Extension<Arc<AppServices>>,
    Path(reward_id): Path<String>,
) -> axum::response::Response {
    match services.redeem(&reward_id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn award_badge(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<AwardBadgeRequest>,
) -> axum::response::Response {
    match services.award_badge(&req.name, &req.description, &req.icon, req.rarity) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
