//! Zone detector implementation.
//!
//! `find_zones` turns candle history into at most `max_zones` ranked zones;
//! `enrich_with_order_book` flags the zones that have resting walls nearby.

use crate::cluster::{cluster_pivots, strength_for};
use crate::config::DetectorConfig;
use crate::pivot::{find_pivots, PivotPoint};
use crate::wall::{bucketize, wall_notional_near, wall_threshold, BucketStats, PriceBucket};
use chrono::{DateTime, Utc};
use srzone_core::{Candle, OrderBook, Period, Zone, ZoneType};
use tracing::debug;

/// Support/resistance zone detector.
///
/// Stateless apart from its configuration; one instance can be shared
/// across tasks.
#[derive(Debug, Clone, Default)]
pub struct ZoneDetector {
    config: DetectorConfig,
}

impl ZoneDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Compute zones for `(symbol, period)` from candles ordered oldest to newest.
    pub fn find_zones(&self, symbol: &str, period: &Period, candles: &[Candle]) -> Vec<Zone> {
        self.find_zones_at(symbol, period, candles, Utc::now())
    }

    /// Same as [`find_zones`](Self::find_zones) with an explicit computation time.
    pub fn find_zones_at(
        &self,
        symbol: &str,
        period: &Period,
        candles: &[Candle],
        created_at: DateTime<Utc>,
    ) -> Vec<Zone> {
        if candles.len() < self.config.min_candles() {
            return Vec::new();
        }

        let pivots = find_pivots(candles, self.config.lookback);

        let mut zones = self.zones_from_pivots(
            &pivots.lows,
            symbol,
            period,
            ZoneType::Support,
            created_at,
        );
        zones.extend(self.zones_from_pivots(
            &pivots.highs,
            symbol,
            period,
            ZoneType::Resistance,
            created_at,
        ));

        let qualified = zones.len();
        rank_zones(&mut zones);
        zones.truncate(self.config.max_zones);

        debug!(
            %symbol,
            %period,
            candles = candles.len(),
            pivot_highs = pivots.highs.len(),
            pivot_lows = pivots.lows.len(),
            qualified,
            kept = zones.len(),
            "Zones computed"
        );

        zones
    }

    fn zones_from_pivots(
        &self,
        pivots: &[PivotPoint],
        symbol: &str,
        period: &Period,
        zone_type: ZoneType,
        created_at: DateTime<Utc>,
    ) -> Vec<Zone> {
        cluster_pivots(pivots, self.config.cluster_tolerance())
            .into_iter()
            .filter_map(|cluster| {
                let strength = strength_for(
                    cluster.touch_count(),
                    cluster.volume(),
                    self.config.touch_weight,
                    self.config.volume_bonus,
                );
                cluster.into_zone(symbol, period, zone_type, strength, created_at)
            })
            .collect()
    }

    /// Flag zones backed by order-book walls.
    ///
    /// Support zones are checked against bids, resistance zones against
    /// asks. A missing or empty book returns the zones untouched.
    pub fn enrich_with_order_book(
        &self,
        mut zones: Vec<Zone>,
        book: Option<&OrderBook>,
        volume_24h_usd: f64,
    ) -> Vec<Zone> {
        let Some(book) = book.filter(|b| !b.is_empty()) else {
            return zones;
        };
        let Some(reference) = book.reference_price().filter(|p| *p > 0.0) else {
            return zones;
        };

        let width = reference * self.config.bucket_width_pct / 100.0;
        let bids = SideWalls::new(bucketize(&book.bids, width), volume_24h_usd, &self.config);
        let asks = SideWalls::new(bucketize(&book.asks, width), volume_24h_usd, &self.config);
        let radius = self.config.wall_search_radius();

        let mut walls = 0usize;
        for zone in &mut zones {
            let side = match zone.zone_type {
                ZoneType::Support => &bids,
                ZoneType::Resistance => &asks,
            };
            let size = side.notional_near(zone.price_center, radius);
            if size > 0.0 {
                zone.has_order_wall = true;
                zone.order_wall_size_usd = size;
                walls += 1;
            }
        }

        debug!(
            symbol = %book.symbol,
            bucket_width = width,
            bid_threshold = bids.threshold,
            ask_threshold = asks.threshold,
            walls,
            "Order book enrichment applied"
        );

        zones
    }
}

/// Buckets and wall threshold of one book side.
struct SideWalls {
    buckets: Vec<PriceBucket>,
    threshold: f64,
}

impl SideWalls {
    fn new(buckets: Vec<PriceBucket>, volume_24h_usd: f64, config: &DetectorConfig) -> Self {
        let stats = BucketStats::from_buckets(&buckets);
        Self {
            threshold: wall_threshold(&stats, volume_24h_usd, config),
            buckets,
        }
    }

    fn notional_near(&self, center: f64, radius: f64) -> f64 {
        if self.buckets.is_empty() {
            return 0.0;
        }
        wall_notional_near(&self.buckets, self.threshold, center, radius)
    }
}

/// Strength descending, then more touches, then lower price.
fn rank_zones(zones: &mut [Zone]) {
    zones.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| b.touch_count.cmp(&a.touch_count))
            .then_with(|| a.price_center.total_cmp(&b.price_center))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use srzone_core::BookLevel;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn candle(i: usize, high: f64, low: f64, quote_volume: f64) -> Candle {
        let t = start() + Duration::minutes(15 * i as i64);
        Candle::new(t, low, high, low, high, 1.0, quote_volume)
    }

    /// Rising series with dips to 100 at indices 10 and 150.
    fn two_touch_history(quote_volume: f64) -> Vec<Candle> {
        (0..200)
            .map(|i| {
                if i == 10 || i == 150 {
                    candle(i, 101.0, 100.0, quote_volume)
                } else {
                    let low = 200.0 + i as f64;
                    candle(i, low + 1.0, low, quote_volume)
                }
            })
            .collect()
    }

    /// Flat series with dips to the given levels, five candles apart.
    fn dip_history(dips: &[f64]) -> Vec<Candle> {
        let len = 5 + dips.len() * 5 + 5;
        let mut candles: Vec<Candle> = (0..len).map(|i| candle(i, 510.0, 500.0, 1_000.0)).collect();
        for (k, price) in dips.iter().enumerate() {
            let i = 5 + k * 5;
            candles[i] = candle(i, price + 1.0, *price, 1_000.0);
        }
        candles
    }

    fn support_at(center: f64) -> Zone {
        Zone {
            symbol: "BTCUSDT".to_string(),
            period: Period::M15,
            zone_type: ZoneType::Support,
            price_center: center,
            price_high: center,
            price_low: center,
            strength: 40.0,
            touch_count: 2,
            breakthrough_count: 0,
            volume: 1.0,
            has_order_wall: false,
            order_wall_size_usd: 0.0,
            last_touch: start(),
            created_at: start(),
        }
    }

    fn resistance_at(center: f64) -> Zone {
        Zone {
            zone_type: ZoneType::Resistance,
            ..support_at(center)
        }
    }

    /// 20 bid levels 98.0..=99.9 and 20 ask levels 100.1..=102.0,
    /// one bucket each; the bid at 99.9 holds `wall` notional.
    fn book_with_bid_wall(base: f64, wall: f64) -> OrderBook {
        let bids = (0..20)
            .map(|k| {
                let price = (999 - k) as f64 / 10.0;
                let notional = if k == 0 { wall } else { base };
                BookLevel::new(price, notional / price)
            })
            .collect();
        let asks = (0..20)
            .map(|k| {
                let price = (1001 + k) as f64 / 10.0;
                BookLevel::new(price, base / price)
            })
            .collect();
        OrderBook::new("BTCUSDT", bids, asks)
    }

    #[test]
    fn test_short_history_yields_nothing() {
        let detector = ZoneDetector::default();
        for len in 0..7 {
            let candles: Vec<Candle> = two_touch_history(1.0).into_iter().take(len).collect();
            assert!(detector.find_zones("BTCUSDT", &Period::M15, &candles).is_empty());
        }
    }

    #[test]
    fn test_two_touch_support_scenario() {
        let detector = ZoneDetector::default();
        let candles = two_touch_history(0.0);
        let zones = detector.find_zones("BTCUSDT", &Period::M15, &candles);

        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.zone_type, ZoneType::Support);
        assert_eq!(zone.touch_count, 2);
        assert_eq!(zone.price_center, 100.0);
        assert_eq!(zone.price_low, 100.0);
        assert_eq!(zone.price_high, 100.0);
        assert_eq!(zone.strength, 30.0);
        assert_eq!(zone.last_touch, candles[150].open_time);
        assert_eq!(zone.symbol, "BTCUSDT");
        assert_eq!(zone.period, Period::M15);
        assert!(!zone.has_order_wall);
    }

    #[test]
    fn test_volume_adds_strength_bonus() {
        let detector = ZoneDetector::default();
        let zones = detector.find_zones("BTCUSDT", &Period::M15, &two_touch_history(5_000.0));

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].strength, 40.0);
        assert_eq!(zones[0].volume, 10_000.0);
    }

    #[test]
    fn test_keeps_top_ten_by_strength() {
        // Four levels touched three times (55), eight touched twice (40).
        let strong = [100.0, 110.0, 120.0, 130.0];
        let weak = [140.0, 150.0, 160.0, 170.0, 180.0, 190.0, 200.0, 210.0];
        let mut dips = Vec::new();
        for _ in 0..3 {
            dips.extend_from_slice(&strong);
        }
        for _ in 0..2 {
            dips.extend_from_slice(&weak);
        }

        let detector = ZoneDetector::default();
        let zones = detector.find_zones("ETHUSDT", &Period::H1, &dip_history(&dips));

        assert_eq!(zones.len(), 10);
        let strengths: Vec<f64> = zones.iter().map(|z| z.strength).collect();
        assert_eq!(&strengths[..4], &[55.0; 4]);
        assert_eq!(&strengths[4..], &[40.0; 6]);

        // Equal strength resolves to lower price first.
        let kept: Vec<f64> = zones.iter().map(|z| z.price_center).collect();
        assert_eq!(
            kept,
            vec![100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0]
        );
    }

    #[test]
    fn test_produced_zones_hold_invariants() {
        let detector = ZoneDetector::default();
        let dips: Vec<f64> = (0..30).map(|i| 100.0 + (i % 7) as f64 * 3.0).collect();
        let zones = detector.find_zones("ETHUSDT", &Period::H4, &dip_history(&dips));

        assert!(!zones.is_empty());
        assert!(zones.len() <= 10);
        for zone in &zones {
            assert!(zone.touch_count >= 2);
            assert!((0.0..=100.0).contains(&zone.strength));
            assert!(zone.validate().is_ok());
        }
    }

    #[test]
    fn test_enrich_flags_bid_wall() {
        let detector = ZoneDetector::default();
        let book = book_with_bid_wall(100_000.0, 400_000.0);
        let zones = detector.enrich_with_order_book(
            vec![support_at(100.0), resistance_at(101.0)],
            Some(&book),
            100_000_000.0,
        );

        assert!(zones[0].has_order_wall);
        assert!((zones[0].order_wall_size_usd - 400_000.0).abs() < 1e-6);
        assert!(!zones[1].has_order_wall);
        assert_eq!(zones[1].order_wall_size_usd, 0.0);
    }

    #[test]
    fn test_enrich_relative_threshold_with_low_floor() {
        // Buckets around $10k with a $40k bucket at 99.9: relative threshold
        // is 3 × 11.5k = 34.5k.
        let detector = ZoneDetector::new(DetectorConfig {
            min_wall_usd: 5_000.0,
            ..Default::default()
        });
        let book = book_with_bid_wall(10_000.0, 40_000.0);
        let zones = detector.enrich_with_order_book(vec![support_at(100.0)], Some(&book), 1_000_000.0);

        assert!(zones[0].has_order_wall);
        assert!((zones[0].order_wall_size_usd - 40_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_enrich_respects_dynamic_floor() {
        // Default $50k floor exceeds the $40k bucket.
        let detector = ZoneDetector::default();
        let book = book_with_bid_wall(10_000.0, 40_000.0);
        let zones = detector.enrich_with_order_book(vec![support_at(100.0)], Some(&book), 1_000_000.0);
        assert!(!zones[0].has_order_wall);

        // Large 24h volume raises the floor above the wall.
        let book = book_with_bid_wall(100_000.0, 400_000.0);
        let zones =
            detector.enrich_with_order_book(vec![support_at(100.0)], Some(&book), 1_000_000_000.0);
        assert!(!zones[0].has_order_wall);
    }

    #[test]
    fn test_enrich_ignores_walls_outside_radius() {
        let detector = ZoneDetector::default();
        let book = book_with_bid_wall(100_000.0, 400_000.0);
        // 99.9 is 0.9% below 100.8
        let zones = detector.enrich_with_order_book(vec![support_at(100.8)], Some(&book), 0.0);
        assert!(!zones[0].has_order_wall);
    }

    #[test]
    fn test_enrich_without_book_is_noop() {
        let detector = ZoneDetector::default();
        let zones = vec![support_at(100.0), resistance_at(110.0)];

        assert_eq!(detector.enrich_with_order_book(zones.clone(), None, 1e9), zones);

        let empty = OrderBook::new("BTCUSDT", vec![], vec![]);
        assert_eq!(detector.enrich_with_order_book(zones.clone(), Some(&empty), 1e9), zones);
    }
}
