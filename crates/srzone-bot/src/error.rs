//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detector error: {0}")]
    Detector(#[from] srzone_detector::DetectorError),

    #[error("Engine error: {0}")]
    Engine(#[from] srzone_engine::EngineError),

    #[error("Provider error: {0}")]
    Provider(#[from] srzone_engine::ProviderError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] srzone_persistence::PersistenceError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] srzone_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
