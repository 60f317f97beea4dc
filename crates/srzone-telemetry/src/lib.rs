//! Prometheus metrics and structured logging for the zone engine.
//!
//! - Structured logging with tracing (pretty, compact or JSON on stderr)
//! - Prometheus metrics for recomputes, persistence and the order-book cache

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::Metrics;
