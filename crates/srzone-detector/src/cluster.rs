//! Tolerance-based pivot clustering and strength scoring.

use crate::pivot::PivotPoint;
use chrono::{DateTime, Utc};
use srzone_core::zone::{MAX_STRENGTH, MIN_TOUCHES};
use srzone_core::{Period, Zone, ZoneType};

/// Pivots merged around a running mean price.
#[derive(Debug, Clone)]
pub struct PivotCluster {
    points: Vec<PivotPoint>,
    mean: f64,
}

impl PivotCluster {
    fn seed(point: PivotPoint) -> Self {
        Self {
            mean: point.price,
            points: vec![point],
        }
    }

    fn absorb(&mut self, point: PivotPoint) {
        self.points.push(point);
        self.mean = self.points.iter().map(|p| p.price).sum::<f64>() / self.points.len() as f64;
    }

    pub fn touch_count(&self) -> u32 {
        self.points.len() as u32
    }

    /// Arithmetic mean of member prices, kept within `[low, high]`
    /// against float rounding.
    pub fn center(&self) -> f64 {
        self.mean.clamp(self.low(), self.high())
    }

    pub fn high(&self) -> f64 {
        self.points.iter().map(|p| p.price).fold(f64::MIN, f64::max)
    }

    pub fn low(&self) -> f64 {
        self.points.iter().map(|p| p.price).fold(f64::MAX, f64::min)
    }

    /// Summed quote volume of all members.
    pub fn volume(&self) -> f64 {
        self.points.iter().map(|p| p.volume).sum()
    }

    pub fn last_touch(&self) -> Option<DateTime<Utc>> {
        self.points.iter().map(|p| p.touch_time).max()
    }

    /// Materialize as a zone. Returns `None` below the minimum touch count.
    pub fn into_zone(
        self,
        symbol: &str,
        period: &Period,
        zone_type: ZoneType,
        strength: f64,
        created_at: DateTime<Utc>,
    ) -> Option<Zone> {
        if self.touch_count() < MIN_TOUCHES {
            return None;
        }
        Some(Zone {
            symbol: symbol.to_string(),
            period: period.clone(),
            zone_type,
            price_center: self.center(),
            price_high: self.high(),
            price_low: self.low(),
            strength,
            touch_count: self.touch_count(),
            breakthrough_count: 0,
            volume: self.volume(),
            has_order_wall: false,
            order_wall_size_usd: 0.0,
            last_touch: self.last_touch().unwrap_or(created_at),
            created_at,
        })
    }
}

/// Greedily cluster pivots of one kind.
///
/// Pivots are sorted by price. Each unused pivot seeds a cluster, and every
/// later unused pivot within `tolerance` (a fraction) of the cluster's
/// current mean joins it; the mean is recomputed after each join, so the
/// window drifts as the cluster grows. Single-pivot clusters are returned
/// too and filtered when materialized.
pub fn cluster_pivots(pivots: &[PivotPoint], tolerance: f64) -> Vec<PivotCluster> {
    let mut sorted: Vec<PivotPoint> = pivots
        .iter()
        .filter(|p| p.price.is_finite() && p.price > 0.0)
        .cloned()
        .collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut used = vec![false; sorted.len()];
    let mut clusters = Vec::new();

    for i in 0..sorted.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut cluster = PivotCluster::seed(sorted[i].clone());

        for j in i + 1..sorted.len() {
            if used[j] {
                continue;
            }
            let mean = cluster.center();
            let distance = (sorted[j].price - mean) / mean;
            if distance > tolerance {
                // sorted ascending and the mean only moves on absorption
                break;
            }
            if distance.abs() <= tolerance {
                used[j] = true;
                cluster.absorb(sorted[j].clone());
            }
        }

        clusters.push(cluster);
    }

    clusters
}

/// Strength score: `min(100, touches × touch_weight)`, plus `volume_bonus`
/// (still capped at 100) when the cluster traded any volume.
pub fn strength_for(touch_count: u32, volume: f64, touch_weight: f64, volume_bonus: f64) -> f64 {
    let mut strength = (touch_count as f64 * touch_weight).min(MAX_STRENGTH);
    if volume > 0.0 {
        strength = (strength + volume_bonus).min(MAX_STRENGTH);
    }
    strength
}
