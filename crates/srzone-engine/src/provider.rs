//! External market-data provider contracts.
//!
//! Implementations own their transport and timeouts; the engine applies
//! none of its own.

use crate::error::ProviderResult;
use async_trait::async_trait;
use srzone_core::{Candle, OrderBook, Period};

/// Closed-candle history source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Up to `limit` most recent candles, ordered oldest to newest.
    async fn get_history(
        &self,
        symbol: &str,
        period: &Period,
        limit: usize,
    ) -> ProviderResult<Vec<Candle>>;
}

/// Order-book snapshot source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderBookProvider: Send + Sync {
    async fn get_order_book(&self, symbol: &str, depth: usize) -> ProviderResult<OrderBook>;
}

/// Rolling 24h traded volume source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VolumeProvider: Send + Sync {
    /// 24h volume in USD.
    async fn volume_24h_usd(&self, symbol: &str) -> ProviderResult<f64>;
}
