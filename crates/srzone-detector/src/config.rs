//! Detector configuration.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};

/// Configuration for zone calculation and wall detection.
///
/// Percentages are expressed in percent (`0.5` means 0.5%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Neighbours required on each side of a pivot.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Relative distance to the running cluster mean for a pivot to join.
    #[serde(default = "default_cluster_tolerance_pct")]
    pub cluster_tolerance_pct: f64,
    /// Zones kept after ranking.
    #[serde(default = "default_max_zones")]
    pub max_zones: usize,
    /// Strength granted per touch.
    #[serde(default = "default_touch_weight")]
    pub touch_weight: f64,
    /// Strength bonus when the cluster traded any volume.
    #[serde(default = "default_volume_bonus")]
    pub volume_bonus: f64,

    /// Order-book bucket width as a percentage of the reference price.
    #[serde(default = "default_bucket_width_pct")]
    pub bucket_width_pct: f64,
    /// Search radius around a zone center for wall buckets.
    #[serde(default = "default_wall_search_radius_pct")]
    pub wall_search_radius_pct: f64,
    /// Relative criterion: wall >= bucket mean × this.
    #[serde(default = "default_wall_mean_multiplier")]
    pub wall_mean_multiplier: f64,
    /// Statistical criterion: wall >= bucket mean + this × σ.
    #[serde(default = "default_wall_sigma_multiplier")]
    pub wall_sigma_multiplier: f64,
    /// Dynamic criterion: wall >= 24h USD volume × this fraction.
    #[serde(default = "default_wall_volume_fraction")]
    pub wall_volume_fraction: f64,
    /// Absolute floor of the dynamic criterion in USD.
    #[serde(default = "default_min_wall_usd")]
    pub min_wall_usd: f64,
}

fn default_lookback() -> usize {
    3
}

fn default_cluster_tolerance_pct() -> f64 {
    0.5
}

fn default_max_zones() -> usize {
    10
}

fn default_touch_weight() -> f64 {
    15.0
}

fn default_volume_bonus() -> f64 {
    10.0
}

fn default_bucket_width_pct() -> f64 {
    0.1
}

fn default_wall_search_radius_pct() -> f64 {
    0.5
}

fn default_wall_mean_multiplier() -> f64 {
    3.0
}

fn default_wall_sigma_multiplier() -> f64 {
    2.0
}

fn default_wall_volume_fraction() -> f64 {
    0.0005 // 0.05% of 24h volume
}

fn default_min_wall_usd() -> f64 {
    50_000.0
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            cluster_tolerance_pct: default_cluster_tolerance_pct(),
            max_zones: default_max_zones(),
            touch_weight: default_touch_weight(),
            volume_bonus: default_volume_bonus(),
            bucket_width_pct: default_bucket_width_pct(),
            wall_search_radius_pct: default_wall_search_radius_pct(),
            wall_mean_multiplier: default_wall_mean_multiplier(),
            wall_sigma_multiplier: default_wall_sigma_multiplier(),
            wall_volume_fraction: default_wall_volume_fraction(),
            min_wall_usd: default_min_wall_usd(),
        }
    }
}

impl DetectorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> DetectorResult<()> {
        if self.lookback == 0 {
            return Err(DetectorError::ConfigError(
                "lookback must be at least 1".to_string(),
            ));
        }

        if self.max_zones == 0 {
            return Err(DetectorError::ConfigError(
                "max_zones must be at least 1".to_string(),
            ));
        }

        let positive = [
            ("cluster_tolerance_pct", self.cluster_tolerance_pct),
            ("touch_weight", self.touch_weight),
            ("bucket_width_pct", self.bucket_width_pct),
            ("wall_search_radius_pct", self.wall_search_radius_pct),
            ("wall_mean_multiplier", self.wall_mean_multiplier),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DetectorError::ConfigError(format!(
                    "{name} ({value}) must be positive"
                )));
            }
        }

        let non_negative = [
            ("volume_bonus", self.volume_bonus),
            ("wall_sigma_multiplier", self.wall_sigma_multiplier),
            ("wall_volume_fraction", self.wall_volume_fraction),
            ("min_wall_usd", self.min_wall_usd),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DetectorError::ConfigError(format!(
                    "{name} ({value}) must be non-negative"
                )));
            }
        }

        Ok(())
    }

    /// Minimum candles needed before any pivot can exist.
    pub fn min_candles(&self) -> usize {
        2 * self.lookback + 1
    }

    /// Cluster tolerance as a fraction.
    pub fn cluster_tolerance(&self) -> f64 {
        self.cluster_tolerance_pct / 100.0
    }

    /// Wall search radius as a fraction.
    pub fn wall_search_radius(&self) -> f64 {
        self.wall_search_radius_pct / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.lookback, 3);
        assert_eq!(config.max_zones, 10);
        assert_eq!(config.min_candles(), 7);
        assert!((config.cluster_tolerance() - 0.005).abs() < 1e-12);
        assert!((config.wall_search_radius() - 0.005).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DetectorConfig {
            lookback: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            bucket_width_pct: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            min_wall_usd: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{"lookback": 5}"#).unwrap();
        assert_eq!(config.lookback, 5);
        assert_eq!(config.max_zones, 10);
        assert_eq!(config.min_wall_usd, 50_000.0);
    }
}
