//! API error types with JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use loosenotes_service::AccessError;
use serde::Serialize;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Unauthorized (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("{0}")]
    Forbidden(String),

    /// Not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500). The message is always generic.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal() -> Self {
        Self::Internal("internal server error".to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(_) => Self::NotFound(err.to_string()),
            AccessError::Forbidden => Self::Forbidden(err.to_string()),
            AccessError::Unauthenticated => Self::Unauthorized(err.to_string()),
            AccessError::Validation(e) => Self::BadRequest(e.to_string()),
            AccessError::Conflict => Self::Conflict(err.to_string()),
            AccessError::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                Self::internal()
            }
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use loosenotes_core::ValidationError;

    #[test]
    fn access_errors_map_to_status_codes() {
        let cases = [
            (AccessError::NotFound("note"), StatusCode::NOT_FOUND),
            (AccessError::Forbidden, StatusCode::FORBIDDEN),
            (AccessError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AccessError::Validation(ValidationError::RatingOutOfRange(9)),
                StatusCode::BAD_REQUEST,
            ),
            (AccessError::Conflict, StatusCode::CONFLICT),
            (
                AccessError::Storage("connection reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (access, status) in cases {
            assert_eq!(ApiError::from(access).status_code(), status);
        }
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let api = ApiError::from(AccessError::Storage("password=hunter2".into()));
        assert!(!api.to_string().contains("hunter2"));
        assert_eq!(api.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn forbidden_message_is_generic() {
        let api = ApiError::from(AccessError::Forbidden);
        assert_eq!(api.to_string(), "not authorized");
    }
}
