//! Order book snapshot types.

use serde::{Deserialize, Serialize};

/// Single price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

impl BookLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }

    /// USD notional resting at this level (`size × price`).
    pub fn notional(&self) -> f64 {
        self.size * self.price
    }
}

/// Depth snapshot for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>, bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self {
            symbol: symbol.into(),
            bids,
            asks,
        }
    }

    /// True when neither side has any level.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Highest bid price. Does not assume the provider sorted the levels.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.iter().map(|l| l.price).reduce(f64::max)
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.iter().map(|l| l.price).reduce(f64::min)
    }

    /// Mid price, or the best level of the only populated side.
    pub fn reference_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_price_mid() {
        let book = OrderBook::new(
            "BTCUSDT",
            vec![BookLevel::new(99.0, 1.0), BookLevel::new(99.5, 2.0)],
            vec![BookLevel::new(100.5, 1.0), BookLevel::new(101.0, 1.0)],
        );
        assert_eq!(book.best_bid(), Some(99.5));
        assert_eq!(book.best_ask(), Some(100.5));
        assert_eq!(book.reference_price(), Some(100.0));
    }

    #[test]
    fn test_reference_price_one_sided() {
        let book = OrderBook::new("BTCUSDT", vec![BookLevel::new(99.0, 1.0)], vec![]);
        assert_eq!(book.reference_price(), Some(99.0));
        assert!(!book.is_empty());

        assert!(OrderBook::default().reference_price().is_none());
        assert!(OrderBook::default().is_empty());
    }

    #[test]
    fn test_level_notional() {
        assert_eq!(BookLevel::new(100.0, 2.5).notional(), 250.0);
    }
}
