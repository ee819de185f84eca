//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gamification::{ActivityError, GamificationError};

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No identity cookie on a view request
    #[error("Missing identity cookie")]
    MissingIdentity,

    /// Relay started without credentials
    #[error("Configuration Error: {0}")]
    NotConfigured(String),

    /// Upstream gamification call failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] GamificationError),

    #[error("Validation error: {0}")]
    Activity(#[from] ActivityError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) | ApiError::Activity(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::MissingIdentity => (StatusCode::UNAUTHORIZED, "MISSING_IDENTITY"),
            ApiError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            ApiError::Upstream(e) => upstream_status(e),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

fn upstream_status(error: &GamificationError) -> (StatusCode, &'static str) {
    match error {
        GamificationError::NotConfigured(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        GamificationError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
        GamificationError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        GamificationError::ApiError { status: 404, .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        GamificationError::ApiError { status, .. } if (400..500).contains(status) => {
            (StatusCode::BAD_REQUEST, "UPSTREAM_REJECTED")
        }
        _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::MissingIdentity, StatusCode::UNAUTHORIZED),
            (
                ApiError::NotConfigured("no key".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Upstream(GamificationError::Timeout),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApiError::Upstream(GamificationError::ApiError {
                    status: 422,
                    message: String::new(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Upstream(GamificationError::Unavailable),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Activity(ActivityError::InvalidDistance(0.0)),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_configuration_error_message() {
        let error = ApiError::NotConfigured("missing gamification API key".to_string());
        assert!(error.to_string().starts_with("Configuration Error"));
    }
}
