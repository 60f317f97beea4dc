//! Support/resistance zone types.
//!
//! Zones are value objects: every recompute produces a fresh set that
//! replaces the previous one wholesale. They carry no durable identity.

use crate::error::{CoreError, Result};
use crate::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of `Zone::strength`.
pub const MAX_STRENGTH: f64 = 100.0;

/// Minimum number of pivots a cluster needs to become a zone.
pub const MIN_TOUCHES: u32 = 2;

/// Zone kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Support,
    Resistance,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Support => "support",
            ZoneType::Resistance => "resistance",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "support" => Ok(ZoneType::Support),
            "resistance" => Ok(ZoneType::Resistance),
            other => Err(CoreError::InvalidZoneType(other.to_string())),
        }
    }
}

/// Identity of a zone set: one per (symbol, period).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneKey {
    pub symbol: String,
    pub period: Period,
}

impl ZoneKey {
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            period,
        }
    }
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.period)
    }
}

/// A candidate support or resistance level.
///
/// Serialized field names are the persisted record layout and must not
/// change without migrating stored sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub symbol: String,
    pub period: Period,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,

    /// Mean price of the clustered pivots.
    pub price_center: f64,
    pub price_high: f64,
    pub price_low: f64,

    /// Score in `[0, 100]`, increasing with touches and volume presence.
    pub strength: f64,
    /// Pivots absorbed into the cluster (always >= 2).
    pub touch_count: u32,
    /// Reserved, currently always zero.
    #[serde(default)]
    pub breakthrough_count: u32,
    /// Summed quote volume at the touching pivots.
    pub volume: f64,

    /// Set by order-book enrichment only.
    #[serde(default)]
    pub has_order_wall: bool,
    #[serde(default, rename = "orderWallSizeUSD")]
    pub order_wall_size_usd: f64,

    /// Latest pivot time in the cluster.
    pub last_touch: DateTime<Utc>,
    /// Computation time.
    pub created_at: DateTime<Utc>,
}

impl Zone {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.touch_count < MIN_TOUCHES {
            return Err(CoreError::InvalidZone(format!(
                "touch_count {} below minimum {}",
                self.touch_count, MIN_TOUCHES
            )));
        }
        if !(0.0..=MAX_STRENGTH).contains(&self.strength) {
            return Err(CoreError::InvalidZone(format!(
                "strength {} outside [0, {}]",
                self.strength, MAX_STRENGTH
            )));
        }
        if !self.price_center.is_finite() || self.price_center <= 0.0 {
            return Err(CoreError::InvalidPrice(format!(
                "price_center {}",
                self.price_center
            )));
        }
        if self.price_low > self.price_center || self.price_center > self.price_high {
            return Err(CoreError::InvalidZone(format!(
                "center {} outside [{}, {}]",
                self.price_center, self.price_low, self.price_high
            )));
        }
        Ok(())
    }

    pub fn is_support(&self) -> bool {
        self.zone_type == ZoneType::Support
    }

    pub fn is_resistance(&self) -> bool {
        self.zone_type == ZoneType::Resistance
    }
}

/// Nearest support and resistance around a price.
///
/// Distances are percentages of the query price and are positive when the
/// side is present, zero otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestZones {
    pub support: Option<Zone>,
    pub resistance: Option<Zone>,
    pub dist_to_support_pct: f64,
    pub dist_to_resist_pct: f64,
}

impl NearestZones {
    /// Pick the closest zone strictly below and strictly above `current_price`.
    ///
    /// Classification is by position relative to the price, not by the
    /// stored zone type: a former resistance that price has moved above
    /// acts as support.
    pub fn from_zones(zones: &[Zone], current_price: f64) -> Self {
        let mut support: Option<&Zone> = None;
        let mut resistance: Option<&Zone> = None;

        for zone in zones {
            if zone.price_center < current_price {
                let dist = current_price - zone.price_center;
                if support.map_or(true, |s| dist < current_price - s.price_center) {
                    support = Some(zone);
                }
            } else if zone.price_center > current_price {
                let dist = zone.price_center - current_price;
                if resistance.map_or(true, |r| dist < r.price_center - current_price) {
                    resistance = Some(zone);
                }
            }
        }

        let pct = |dist: f64| {
            if current_price > 0.0 {
                dist / current_price * 100.0
            } else {
                0.0
            }
        };

        Self {
            dist_to_support_pct: support.map_or(0.0, |s| pct(current_price - s.price_center)),
            dist_to_resist_pct: resistance.map_or(0.0, |r| pct(r.price_center - current_price)),
            support: support.cloned(),
            resistance: resistance.cloned(),
        }
    }
}
