//! Error types for srzone-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid zone: {0}")]
    InvalidZone(String),

    #[error("Invalid zone type: {0}")]
    InvalidZoneType(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
