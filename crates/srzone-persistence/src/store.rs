//! Zone store contract, key layout and expiry policy.

use crate::error::PersistenceResult;
use async_trait::async_trait;
use srzone_core::{NearestZones, Period, Zone};
use std::time::Duration;

/// Key prefix of all zone sets.
pub const ZONE_KEY_PREFIX: &str = "sr:zones";

/// Expiry for periods without a dedicated entry.
pub const DEFAULT_ZONE_TTL: Duration = Duration::from_secs(60 * 60);

/// Sorted-set key for `(symbol, period)`.
pub fn zone_key(symbol: &str, period: &Period) -> String {
    format!("{ZONE_KEY_PREFIX}:{symbol}:{period}")
}

/// Expiry of a zone set, about three candle closes of the period, so a
/// set survives one missed recompute but not several.
pub fn zone_ttl(period: &Period) -> Duration {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    let secs = match period {
        Period::M5 => 15 * MINUTE,
        Period::M15 => 45 * MINUTE,
        Period::M30 => 90 * MINUTE,
        Period::H1 => 3 * HOUR,
        Period::H4 => 12 * HOUR,
        Period::D1 => 3 * 24 * HOUR,
        Period::Other(_) => return DEFAULT_ZONE_TTL,
    };
    Duration::from_secs(secs)
}

/// Persistence of zone sets keyed by (symbol, period).
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Replace the stored set for `(symbol, period)` and reset its expiry.
    ///
    /// Zones that fail to serialize are skipped; the rest are written.
    async fn save_zones(&self, symbol: &str, period: &Period, zones: &[Zone])
        -> PersistenceResult<()>;

    /// Stored zones ordered by `price_center` ascending. Empty when the
    /// set is missing or expired.
    async fn get_zones(&self, symbol: &str, period: &Period) -> PersistenceResult<Vec<Zone>>;

    /// Nearest support below and resistance above `current_price`.
    async fn get_nearest_zones(
        &self,
        symbol: &str,
        period: &Period,
        current_price: f64,
    ) -> PersistenceResult<NearestZones> {
        let zones = self.get_zones(symbol, period).await?;
        Ok(NearestZones::from_zones(&zones, current_price))
    }

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_key_layout() {
        assert_eq!(zone_key("BTCUSDT", &Period::M15), "sr:zones:BTCUSDT:15m");
        assert_eq!(
            zone_key("ETHUSDT", &Period::Other("2h".to_string())),
            "sr:zones:ETHUSDT:2h"
        );
    }

    #[test]
    fn test_ttl_table() {
        let minutes = |p: Period| zone_ttl(&p).as_secs() / 60;
        assert_eq!(minutes(Period::M5), 15);
        assert_eq!(minutes(Period::M15), 45);
        assert_eq!(minutes(Period::M30), 90);
        assert_eq!(minutes(Period::H1), 180);
        assert_eq!(minutes(Period::H4), 720);
        assert_eq!(minutes(Period::D1), 3 * 24 * 60);
        assert_eq!(minutes(Period::Other("1w".to_string())), 60);
    }
}
