//! Per-symbol order-book snapshot cache.
//!
//! One snapshot serves every period of a symbol until it is older than
//! the TTL. Concurrent misses for the same symbol may both fetch; the
//! later insert wins.

use crate::error::ProviderResult;
use crate::provider::OrderBookProvider;
use parking_lot::RwLock;
use srzone_core::OrderBook;
use srzone_telemetry::Metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct CachedBook {
    book: Arc<OrderBook>,
    fetched_at: Instant,
}

/// TTL cache of order-book snapshots keyed by symbol.
#[derive(Debug)]
pub struct OrderBookCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedBook>>,
}

impl OrderBookCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot for `symbol` if it is younger than the TTL.
    pub fn get(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        let entries = self.entries.read();
        entries
            .get(symbol)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.book))
    }

    /// Store a fresh snapshot, dropping any expired entries.
    pub fn insert(&self, symbol: &str, book: OrderBook) -> Arc<OrderBook> {
        let book = Arc::new(book);
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, cached| now.duration_since(cached.fetched_at) < self.ttl);
        entries.insert(
            symbol.to_string(),
            CachedBook {
                book: Arc::clone(&book),
                fetched_at: now,
            },
        );
        book
    }

    /// Cached snapshot, or fetch through `provider` and cache on success.
    ///
    /// Fetch failures are not cached.
    pub async fn get_or_fetch(
        &self,
        symbol: &str,
        provider: &dyn OrderBookProvider,
        depth: usize,
    ) -> ProviderResult<Arc<OrderBook>> {
        if let Some(book) = self.get(symbol) {
            trace!(symbol = %symbol, "Order book cache hit");
            Metrics::order_book_cache("hit");
            return Ok(book);
        }

        Metrics::order_book_cache("miss");
        let book = match provider.get_order_book(symbol, depth).await {
            Ok(book) => book,
            Err(e) => {
                Metrics::order_book_cache("fetch_failed");
                return Err(e);
            }
        };
        debug!(
            symbol = %symbol,
            bids = book.bids.len(),
            asks = book.asks.len(),
            "Order book fetched"
        );
        Ok(self.insert(symbol, book))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::MockOrderBookProvider;
    use srzone_core::BookLevel;
    use srzone_telemetry::metrics::ORDER_BOOK_CACHE_TOTAL;

    fn book(symbol: &str) -> OrderBook {
        OrderBook::new(
            symbol,
            vec![BookLevel::new(99.0, 10.0)],
            vec![BookLevel::new(101.0, 10.0)],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl() {
        let mut provider = MockOrderBookProvider::new();
        provider
            .expect_get_order_book()
            .withf(|symbol, depth| symbol == "BTCUSDT" && *depth == 200)
            .times(1)
            .returning(|symbol, _| Ok(book(symbol)));

        let cache = OrderBookCache::new(Duration::from_secs(60));
        let first = cache.get_or_fetch("BTCUSDT", &provider, 200).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = cache.get_or_fetch("BTCUSDT", &provider, 200).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_ttl() {
        let mut provider = MockOrderBookProvider::new();
        provider
            .expect_get_order_book()
            .times(2)
            .returning(|symbol, _| Ok(book(symbol)));

        let cache = OrderBookCache::new(Duration::from_secs(60));
        cache.get_or_fetch("BTCUSDT", &provider, 200).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("BTCUSDT").is_none());
        cache.get_or_fetch("BTCUSDT", &provider, 200).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mut provider = MockOrderBookProvider::new();
        provider
            .expect_get_order_book()
            .times(1)
            .returning(|_, _| Err(ProviderError::Unavailable("down".to_string())));

        let failed = ORDER_BOOK_CACHE_TOTAL.with_label_values(&["fetch_failed"]);
        let before = failed.get();

        let cache = OrderBookCache::new(Duration::from_secs(60));
        assert!(cache.get_or_fetch("ETHUSDT", &provider, 50).await.is_err());
        assert!(cache.is_empty());
        assert!(failed.get() >= before + 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_evicts_expired_entries() {
        let cache = OrderBookCache::new(Duration::from_secs(60));
        cache.insert("BTCUSDT", book("BTCUSDT"));
        tokio::time::advance(Duration::from_secs(90)).await;
        cache.insert("ETHUSDT", book("ETHUSDT"));

        assert_eq!(cache.len(), 1);
        assert!(cache.get("ETHUSDT").is_some());
    }
}
