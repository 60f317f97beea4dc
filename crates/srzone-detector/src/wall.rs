//! Order-book wall detection.
//!
//! Book levels are aggregated into fixed-width price buckets of USD
//! notional. A bucket is a wall when its notional reaches the side's
//! threshold, the maximum of a relative, a statistical and a
//! volume-based criterion.

use crate::config::DetectorConfig;
use srzone_core::BookLevel;
use std::collections::BTreeMap;

/// Guards `floor(price / width)` against float drift right below a boundary.
const BUCKET_EPSILON: f64 = 1e-9;

/// Aggregated notional within `[price_key, price_key + width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBucket {
    /// Bucket lower bound.
    pub price_key: f64,
    pub volume_usd: f64,
    /// Levels that fell in the bucket.
    pub count: usize,
}

/// Mean and population standard deviation of bucket notionals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BucketStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl BucketStats {
    pub fn from_buckets(buckets: &[PriceBucket]) -> Self {
        if buckets.is_empty() {
            return Self::default();
        }
        let n = buckets.len() as f64;
        let mean = buckets.iter().map(|b| b.volume_usd).sum::<f64>() / n;
        let variance = buckets
            .iter()
            .map(|b| (b.volume_usd - mean).powi(2))
            .sum::<f64>()
            / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Aggregate levels into buckets of `width`, ordered by price.
///
/// Levels with non-positive price or size are ignored.
pub fn bucketize(levels: &[BookLevel], width: f64) -> Vec<PriceBucket> {
    if !(width.is_finite() && width > 0.0) {
        return Vec::new();
    }

    let mut buckets: BTreeMap<i64, PriceBucket> = BTreeMap::new();
    for level in levels {
        if !(level.price > 0.0 && level.size > 0.0) {
            continue;
        }
        let index = (level.price / width + BUCKET_EPSILON).floor() as i64;
        let bucket = buckets.entry(index).or_insert_with(|| PriceBucket {
            price_key: index as f64 * width,
            volume_usd: 0.0,
            count: 0,
        });
        bucket.volume_usd += level.notional();
        bucket.count += 1;
    }

    buckets.into_values().collect()
}

/// Wall threshold for one side of the book.
///
/// The maximum of:
/// 1. relative: `mean × wall_mean_multiplier`
/// 2. statistical: `mean + wall_sigma_multiplier × σ`
/// 3. dynamic: `max(volume_24h_usd × wall_volume_fraction, min_wall_usd)`
pub fn wall_threshold(stats: &BucketStats, volume_24h_usd: f64, config: &DetectorConfig) -> f64 {
    let relative = stats.mean * config.wall_mean_multiplier;
    let statistical = stats.mean + config.wall_sigma_multiplier * stats.std_dev;
    let dynamic = (volume_24h_usd.max(0.0) * config.wall_volume_fraction).max(config.min_wall_usd);
    relative.max(statistical).max(dynamic)
}

/// Summed notional of wall buckets within `radius` (a fraction) of `center`.
pub fn wall_notional_near(buckets: &[PriceBucket], threshold: f64, center: f64, radius: f64) -> f64 {
    let lower = center * (1.0 - radius);
    let upper = center * (1.0 + radius);
    buckets
        .iter()
        .filter(|b| b.price_key >= lower && b.price_key <= upper)
        .filter(|b| b.volume_usd >= threshold)
        .map(|b| b.volume_usd)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with_notional(price: f64, notional: f64) -> BookLevel {
        BookLevel::new(price, notional / price)
    }

    #[test]
    fn test_bucketize_groups_levels() {
        let levels = vec![
            level_with_notional(99.91, 1_000.0),
            level_with_notional(99.95, 2_000.0),
            level_with_notional(99.80, 500.0),
            BookLevel::new(99.85, 0.0),
        ];
        let buckets = bucketize(&levels, 0.1);

        assert_eq!(buckets.len(), 2);
        assert!((buckets[0].price_key - 99.8).abs() < 1e-9);
        assert_eq!(buckets[0].count, 1);
        assert!((buckets[1].price_key - 99.9).abs() < 1e-9);
        assert_eq!(buckets[1].count, 2);
        assert!((buckets[1].volume_usd - 3_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_bucket_boundary_is_stable() {
        // 99.9 / 0.1 evaluates to 998.999..., the epsilon keeps it in 99.9
        let buckets = bucketize(&[level_with_notional(99.9, 1.0)], 0.1);
        assert!((buckets[0].price_key - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_stats_population_std_dev() {
        let buckets: Vec<PriceBucket> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .enumerate()
            .map(|(i, v)| PriceBucket {
                price_key: i as f64,
                volume_usd: *v,
                count: 1,
            })
            .collect();
        let stats = BucketStats::from_buckets(&buckets);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);

        assert_eq!(BucketStats::from_buckets(&[]), BucketStats::default());
    }

    #[test]
    fn test_threshold_is_max_of_criteria() {
        let config = DetectorConfig::default();
        let cases = [
            (10_000.0, 1_000.0, 1_000_000.0),
            (10_000.0, 50_000.0, 1_000_000.0),
            (100_000.0, 5_000.0, 0.0),
            (1_000.0, 100.0, 1_000_000_000.0),
            (0.0, 0.0, 0.0),
        ];
        for (mean, std_dev, volume) in cases {
            let stats = BucketStats { mean, std_dev };
            let t = wall_threshold(&stats, volume, &config);
            assert!(t >= mean * 3.0);
            assert!(t >= mean + 2.0 * std_dev);
            assert!(t >= (volume * 0.0005_f64).max(50_000.0));
            let expected = (mean * 3.0)
                .max(mean + 2.0 * std_dev)
                .max((volume * 0.0005_f64).max(50_000.0));
            assert_eq!(t, expected);
        }
    }

    #[test]
    fn test_threshold_dominated_by_each_criterion() {
        let config = DetectorConfig::default();

        let relative = BucketStats { mean: 100_000.0, std_dev: 1_000.0 };
        assert_eq!(wall_threshold(&relative, 0.0, &config), 300_000.0);

        let statistical = BucketStats { mean: 100_000.0, std_dev: 500_000.0 };
        assert_eq!(wall_threshold(&statistical, 0.0, &config), 1_100_000.0);

        let dynamic = BucketStats { mean: 1_000.0, std_dev: 100.0 };
        let t = wall_threshold(&dynamic, 1_000_000_000.0, &config);
        assert!((t - 500_000.0).abs() < 1e-6);
        assert_eq!(wall_threshold(&dynamic, 0.0, &config), 50_000.0);
    }

    #[test]
    fn test_wall_notional_near() {
        let buckets = vec![
            PriceBucket { price_key: 99.0, volume_usd: 500_000.0, count: 1 },
            PriceBucket { price_key: 99.7, volume_usd: 400_000.0, count: 1 },
            PriceBucket { price_key: 99.9, volume_usd: 100_000.0, count: 1 },
            PriceBucket { price_key: 100.2, volume_usd: 350_000.0, count: 1 },
        ];
        // radius 0.5% around 100: [99.5, 100.5]; 99.0 is out of range
        let total = wall_notional_near(&buckets, 300_000.0, 100.0, 0.005);
        assert_eq!(total, 750_000.0);
    }
}
