//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Storage Error ==
/// Failures reported by a storage substrate.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing the item would exceed the substrate's byte quota
    #[error("Quota exceeded: writing {needed} bytes with {used}/{quota} bytes in use")]
    QuotaExceeded {
        needed: usize,
        used: usize,
        quota: usize,
    },

    /// Substrate cannot be used in this environment
    #[error("Storage unavailable")]
    Unavailable,

    /// Backing file could not be read or written
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file holds something other than a string map
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Codec Error ==
/// Failures at the JSON boundary between raw storage strings and typed entries.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Raw string is not a valid cache entry envelope
    #[error("Malformed entry: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Envelope is valid but its value does not decode as the requested type
    #[error("Value type mismatch: {0}")]
    TypeMismatch(#[source] serde_json::Error),

    /// Value could not be serialized
    #[error("Encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

// == Fetch Error ==
/// Failures of cache-backed network requests.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("API request failed: {0}")]
    Status(u16),

    /// Request method is not a valid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request options or body could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Returns the HTTP status code carried by a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

// == API Error ==
/// Errors surfaced by the HTTP service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache (absent, expired or malformed)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage refused the write even after eviction
    #[error("Insufficient storage: {0}")]
    InsufficientStorage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientStorage(_) => StatusCode::INSUFFICIENT_STORAGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP service.
pub type Result<T> = std::result::Result<T, ApiError>;
