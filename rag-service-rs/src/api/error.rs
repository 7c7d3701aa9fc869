use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::AskError;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 422 - Request body missing, malformed or out of bounds
    Validation(String),

    /// Failure from the ask pipeline, status per category
    Ask(AskError),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
            ApiError::Ask(err) => (
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.kind(),
                err.to_string(),
            ),
        };

        let body = ErrorBody {
            error: error_type.into(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        ApiError::Ask(err)
    }
}
