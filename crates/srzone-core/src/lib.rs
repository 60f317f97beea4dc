//! Core domain types for the support/resistance zone engine.
//!
//! This crate provides the value types shared by every other crate:
//! - `Candle`: one closed OHLCV bar of a (symbol, period) history
//! - `Zone`, `ZoneType`: a clustered support or resistance level
//! - `NearestZones`: nearest support/resistance around a price
//! - `OrderBook`, `BookLevel`: a depth snapshot used for wall detection
//! - `Period`: coarse candle period label (`15m`, `1h`, `1d`, ...)
//! - `CandleClosed`: the event that triggers a zone recompute

pub mod candle;
pub mod error;
pub mod event;
pub mod order_book;
pub mod period;
pub mod zone;

pub use candle::Candle;
pub use error::{CoreError, Result};
pub use event::CandleClosed;
pub use order_book::{BookLevel, OrderBook};
pub use period::Period;
pub use zone::{NearestZones, Zone, ZoneKey, ZoneType};
