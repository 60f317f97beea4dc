//! Events consumed by the recompute orchestrator.

use crate::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candle for `(symbol, period)` has closed.
///
/// Delivery is at-least-once; consumers must tolerate duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleClosed {
    pub symbol: String,
    pub period: Period,
    /// Close time of the candle that triggered the event.
    pub close_time: DateTime<Utc>,
}

impl CandleClosed {
    pub fn new(symbol: impl Into<String>, period: Period, close_time: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            period,
            close_time,
        }
    }
}
