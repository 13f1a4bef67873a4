//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Sw Error Enum ==
/// Unified error type for the caching proxy.
///
/// Cloneable so a single in-flight fetch can hand the same failure to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwError {
    /// The network request could not be completed (connection refused, DNS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered, but the body could not be read
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Requested cache namespace or entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Pre-caching the install-time asset list failed
    #[error("Install failed: {0}")]
    Install(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for SwError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SwError::Network(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            SwError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            SwError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            SwError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            SwError::Install(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            SwError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, SwError>;
