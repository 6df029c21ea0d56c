//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! translation to HTTP responses. Every error body has the shape
//! `{"error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use gramseva_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// An error from the underlying database library (pool setup, migrations).
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// A standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors. The message is not
    /// exposed to clients.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Port(PortError::Validation(msg.into()))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Port(PortError::Forbidden(msg.into()))
    }

    pub fn unauthorized() -> Self {
        ApiError::Port(PortError::Unauthorized)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            ApiError::Port(PortError::Forbidden(_)) => {
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            ApiError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Port(PortError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Store rejections surface with their message, as the original
            // surface did; they are the caller's 400s, not our 500s.
            ApiError::Port(PortError::Unexpected(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Config(_) | ApiError::Database(_) | ApiError::Io(_) => {
                error!("infrastructure error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                error!("unexpected error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
