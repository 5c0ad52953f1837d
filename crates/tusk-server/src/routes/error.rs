use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tusk_service::ServiceError;

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) | ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::InvalidTransition(_) => StatusCode::CONFLICT,
        ServiceError::Internal(_) => {
            tracing::error!("request failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, e.to_string())
}

/// A request body that could not be decoded.
pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    error_body(StatusCode::BAD_REQUEST, msg.into())
}

pub(crate) fn error_body(status: StatusCode, msg: String) -> ApiError {
    (status, Json(json!({ "error": msg })))
}
