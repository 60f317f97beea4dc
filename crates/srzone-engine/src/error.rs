//! Engine and provider error types.

use thiserror::Error;

/// Failure reported by an external market-data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Orchestrator already started")]
    AlreadyStarted,

    #[error("Orchestrator is shutting down")]
    ShuttingDown,
}

pub type EngineResult<T> = Result<T, EngineError>;
