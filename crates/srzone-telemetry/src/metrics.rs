//! Prometheus metrics for the zone engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, a programming error that should crash at
//! startup. Registration only happens on first access.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

/// Recompute outcomes.
/// Labels: period, outcome (saved/insufficient_data/no_zones/history_failed/save_failed/cancelled)
pub static RECOMPUTE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "srzone_recompute_total",
        "Zone recomputes by outcome",
        &["period", "outcome"]
    )
    .unwrap()
});

/// Wall-clock duration of one recompute.
pub static RECOMPUTE_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "srzone_recompute_latency_ms",
        "Zone recompute duration in milliseconds",
        &["period"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Zones written to the store.
pub static ZONES_PERSISTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "srzone_zones_persisted_total",
        "Zones written to the store",
        &["period", "type"]
    )
    .unwrap()
});

/// Order-book cache lookups.
/// Labels: result (hit/miss/fetch_failed)
pub static ORDER_BOOK_CACHE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "srzone_order_book_cache_total",
        "Order book cache lookups by result",
        &["result"]
    )
    .unwrap()
});

/// Events folded into an already running recompute for the same key.
pub static EVENTS_COALESCED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "srzone_events_coalesced_total",
        "Candle-close events coalesced into an in-flight recompute"
    )
    .unwrap()
});

/// Recompute tasks currently in flight.
pub static RECOMPUTES_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "srzone_recomputes_in_flight",
        "Zone recompute tasks currently in flight"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a finished recompute.
    pub fn recompute_finished(period: &str, outcome: &str, latency_ms: f64) {
        RECOMPUTE_TOTAL.with_label_values(&[period, outcome]).inc();
        RECOMPUTE_LATENCY_MS
            .with_label_values(&[period])
            .observe(latency_ms);
    }

    /// Record persisted zones.
    pub fn zones_persisted(period: &str, zone_type: &str, count: usize) {
        ZONES_PERSISTED_TOTAL
            .with_label_values(&[period, zone_type])
            .inc_by(count as f64);
    }

    /// Record an order-book cache lookup.
    pub fn order_book_cache(result: &str) {
        ORDER_BOOK_CACHE_TOTAL.with_label_values(&[result]).inc();
    }

    pub fn event_coalesced() {
        EVENTS_COALESCED_TOTAL.inc();
    }

    pub fn recompute_started() {
        RECOMPUTES_IN_FLIGHT.inc();
    }

    pub fn recompute_ended() {
        RECOMPUTES_IN_FLIGHT.dec();
    }

    /// Render the default registry in the Prometheus text format.
    pub fn encode() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_metrics_are_exported() {
        Metrics::recompute_finished("15m", "saved", 12.0);
        Metrics::zones_persisted("15m", "support", 3);
        Metrics::order_book_cache("hit");
        Metrics::event_coalesced();

        let text = Metrics::encode().unwrap();
        assert!(text.contains("srzone_recompute_total"));
        assert!(text.contains("srzone_zones_persisted_total"));
        assert!(text.contains("srzone_order_book_cache_total"));
        assert!(text.contains("srzone_events_coalesced_total"));
    }

    #[test]
    fn test_in_flight_gauge() {
        let before = RECOMPUTES_IN_FLIGHT.get();
        Metrics::recompute_started();
        Metrics::recompute_ended();
        assert_eq!(RECOMPUTES_IN_FLIGHT.get(), before);
    }
}
