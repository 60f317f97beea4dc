//! Support/resistance zone service.
//!
//! Wires the zone engine to the outside world:
//! - TOML configuration
//! - candle-close scheduler publishing onto the event bus
//! - REST market-data client implementing the engine's providers
//! - HTTP query API over the zone store
//! - startup, Ctrl-C handling and ordered shutdown

pub mod api;
pub mod app;
pub mod binance;
pub mod config;
pub mod error;
pub mod scheduler;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
