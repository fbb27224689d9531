use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing;

use whatsport_core::CoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Bridges the core error taxonomy to HTTP responses. Transition refusals
/// map to 400 like the original backend; duplicate guards and optimistic
/// conflicts map to 409.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoreError::Unauthorized(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CoreError::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
            CoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            CoreError::AlreadyMember => (StatusCode::CONFLICT, "ALREADY_MEMBER"),
            CoreError::AlreadyParticipant => (StatusCode::CONFLICT, "ALREADY_PARTICIPANT"),
            CoreError::CapacityExceeded => (StatusCode::BAD_REQUEST, "EVENT_FULL"),
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CoreError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Storage error: {}", self.0);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(serde_json::json!({ "error": message, "code": code }))).into_response()
    }
}
