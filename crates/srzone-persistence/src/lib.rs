//! Zone persistence for the support/resistance engine.
//!
//! One sorted set per (symbol, period) under `sr:zones:{symbol}:{period}`,
//! scored by zone center, each member a JSON zone record. Writes replace
//! the whole set and reset a period-dependent expiry.

pub mod error;
pub mod memory_store;
pub mod redis_store;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use memory_store::MemoryZoneStore;
pub use redis_store::RedisZoneStore;
pub use store::{zone_key, zone_ttl, ZoneStore};
