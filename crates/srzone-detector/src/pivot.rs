//! Pivot point detection.

use chrono::{DateTime, Utc};
use srzone_core::Candle;

/// Local price extreme confirmed by neighbouring candles.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPoint {
    pub price: f64,
    /// Quote volume of the pivot candle.
    pub volume: f64,
    /// Start time of the pivot candle.
    pub touch_time: DateTime<Utc>,
}

/// Pivot highs (resistance candidates) and lows (support candidates).
#[derive(Debug, Clone, Default)]
pub struct Pivots {
    pub highs: Vec<PivotPoint>,
    pub lows: Vec<PivotPoint>,
}

impl Pivots {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }
}

/// Scan `candles` (oldest to newest) for pivots.
///
/// Candle `i` is a pivot high when its high is strictly greater than the
/// highs of the `lookback` candles on each side, and a pivot low when its
/// low is strictly less than theirs. The first and last `lookback` candles
/// never qualify. Fewer than `2 × lookback + 1` candles yields nothing.
pub fn find_pivots(candles: &[Candle], lookback: usize) -> Pivots {
    let mut pivots = Pivots::default();

    if lookback == 0 || candles.len() < 2 * lookback + 1 {
        return pivots;
    }

    for i in lookback..candles.len() - lookback {
        let candle = &candles[i];
        let neighbours = candles[i - lookback..i]
            .iter()
            .chain(&candles[i + 1..=i + lookback]);

        let mut is_high = true;
        let mut is_low = true;
        for other in neighbours {
            if other.high >= candle.high {
                is_high = false;
            }
            if other.low <= candle.low {
                is_low = false;
            }
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            pivots.highs.push(PivotPoint {
                price: candle.high,
                volume: candle.quote_volume,
                touch_time: candle.open_time,
            });
        }
        if is_low {
            pivots.lows.push(PivotPoint {
                price: candle.low,
                volume: candle.quote_volume,
                touch_time: candle.open_time,
            });
        }
    }

    pivots
}
