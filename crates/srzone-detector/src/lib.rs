//! Support/resistance zone calculation.
//!
//! Turns a candle history into ranked price zones:
//! 1. Pivot detection: local highs/lows confirmed by `lookback` neighbours
//! 2. Clustering: pivots within a drifting relative tolerance are merged
//! 3. Scoring and selection: strength from touches and volume, top-N kept
//! 4. Optional order-book enrichment: flags zones backed by resting walls
//!
//! Everything here is pure and stateless, safe to call concurrently.

pub mod cluster;
pub mod config;
pub mod detector;
pub mod error;
pub mod pivot;
pub mod wall;

pub use cluster::{cluster_pivots, strength_for, PivotCluster};
pub use config::DetectorConfig;
pub use detector::ZoneDetector;
pub use error::{DetectorError, DetectorResult};
pub use pivot::{find_pivots, PivotPoint, Pivots};
pub use wall::{bucketize, wall_notional_near, wall_threshold, BucketStats, PriceBucket};
