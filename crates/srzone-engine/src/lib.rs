//! Event-driven zone recompute orchestration.
//!
//! Subscribes to candle-close events and, per event, fetches history,
//! runs the zone detector, enriches with a cached order book and writes
//! the result through a `ZoneStore`:
//! - `provider`: external market-data contracts
//! - `bus`: in-process typed event bus
//! - `book_cache`: per-symbol order-book snapshot cache with TTL
//! - `orchestrator`: bounded, coalescing per-event dispatch and shutdown

pub mod book_cache;
pub mod bus;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provider;

pub use book_cache::OrderBookCache;
pub use bus::EventBus;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ProviderError, ProviderResult};
pub use orchestrator::{Providers, RecomputeOrchestrator, RecomputeOutcome};
pub use provider::{CandleProvider, OrderBookProvider, VolumeProvider};
