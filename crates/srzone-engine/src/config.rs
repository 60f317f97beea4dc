//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recompute orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candles requested per recompute.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Recomputes with fewer fetched candles are dropped.
    #[serde(default = "default_min_candles")]
    pub min_candles: usize,
    /// Depth requested from the order-book provider.
    #[serde(default = "default_order_book_depth")]
    pub order_book_depth: usize,
    /// Order-book snapshot reuse window (seconds).
    #[serde(default = "default_order_book_ttl_secs")]
    pub order_book_ttl_secs: u64,
    /// Recomputes allowed to run at once across all keys.
    #[serde(default = "default_max_concurrent_recomputes")]
    pub max_concurrent_recomputes: usize,
}

fn default_history_limit() -> usize {
    200
}

fn default_min_candles() -> usize {
    10
}

fn default_order_book_depth() -> usize {
    200
}

fn default_order_book_ttl_secs() -> u64 {
    60
}

fn default_max_concurrent_recomputes() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            min_candles: default_min_candles(),
            order_book_depth: default_order_book_depth(),
            order_book_ttl_secs: default_order_book_ttl_secs(),
            max_concurrent_recomputes: default_max_concurrent_recomputes(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_concurrent_recomputes == 0 {
            return Err(EngineError::Config(
                "max_concurrent_recomputes must be at least 1".to_string(),
            ));
        }
        if self.history_limit < self.min_candles {
            return Err(EngineError::Config(format!(
                "history_limit ({}) must be >= min_candles ({})",
                self.history_limit, self.min_candles
            )));
        }
        if self.order_book_depth == 0 {
            return Err(EngineError::Config(
                "order_book_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn order_book_ttl(&self) -> Duration {
        Duration::from_secs(self.order_book_ttl_secs)
    }
}
