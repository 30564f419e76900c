use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ecosmart_core::DomainError;
use ecosmart_infra::StoreError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientPoints { .. } => json_error(StatusCode::CONFLICT, "insufficient_points", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::warn!(error = %err, "scan history unavailable");
    json_error(StatusCode::SERVICE_UNAVAILABLE, "store_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
