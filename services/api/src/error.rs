//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and the mapping
//! from core errors to HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use insighthub_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The HTTP status for a core error. Client mistakes are 400s.
pub fn status_for(err: &PortError) -> StatusCode {
    match err {
        PortError::InvalidArgument(_) | PortError::NotFound(_) | PortError::Extraction(_) => {
            StatusCode::BAD_REQUEST
        }
        PortError::Model(_) => StatusCode::BAD_GATEWAY,
        PortError::Ocr(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts a core error into the `(status, message)` pair handlers return.
pub fn port_error_response(err: PortError) -> (StatusCode, String) {
    let status = status_for(&err);
    let message = match err {
        PortError::InvalidArgument(m)
        | PortError::NotFound(m)
        | PortError::Extraction(m) => m,
        other => other.to_string(),
    };
    (status, message)
}
