//! Candle-close scheduler.
//!
//! Publishes a `CandleClosed` event for every configured symbol when a
//! period boundary passes. Boundaries are aligned to the Unix epoch in
//! UTC, which matches exchange kline boundaries for all supported
//! periods.

use crate::config::SchedulerConfig;
use chrono::{DateTime, Utc};
use srzone_core::{CandleClosed, Period};
use srzone_engine::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// First boundary of `period` strictly after `now`.
pub fn next_boundary(now: DateTime<Utc>, period: &Period) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(period.duration()?.as_secs()).ok()?;
    if secs == 0 {
        return None;
    }
    let next = (now.timestamp().div_euclid(secs) + 1) * secs;
    DateTime::from_timestamp(next, 0)
}

pub struct CandleCloseScheduler {
    symbols: Vec<String>,
    periods: Vec<Period>,
    settle_delay: Duration,
    bus: EventBus<CandleClosed>,
}

impl CandleCloseScheduler {
    pub fn new(config: &SchedulerConfig, bus: EventBus<CandleClosed>) -> Self {
        Self {
            symbols: config.symbols.clone(),
            periods: config.periods.clone(),
            settle_delay: config.settle_delay(),
            bus,
        }
    }

    /// Publish a close of `period` at `close_time` for every symbol.
    pub fn publish_period(&self, period: &Period, close_time: DateTime<Utc>) -> usize {
        for symbol in &self.symbols {
            self.bus
                .publish(CandleClosed::new(symbol.clone(), period.clone(), close_time));
        }
        debug!(period = %period, symbols = self.symbols.len(), %close_time, "Candle closes published");
        self.symbols.len()
    }

    /// Publish one event for every (symbol, period).
    pub fn publish_all(&self, close_time: DateTime<Utc>) -> usize {
        self.periods
            .iter()
            .map(|period| self.publish_period(period, close_time))
            .sum()
    }

    /// Run one timer per period until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::new(self);
        tokio::spawn(async move {
            info!(
                symbols = ?scheduler.symbols,
                periods = ?scheduler.periods.iter().map(Period::as_str).collect::<Vec<_>>(),
                "Candle-close scheduler started"
            );

            let mut timers = JoinSet::new();
            for period in scheduler.periods.clone() {
                let scheduler = Arc::clone(&scheduler);
                let cancel = cancel.clone();
                timers.spawn(async move { scheduler.run_period(&period, &cancel).await });
            }
            while let Some(result) = timers.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Scheduler timer task failed");
                }
            }

            info!("Candle-close scheduler stopped");
        })
    }

    async fn run_period(&self, period: &Period, cancel: &CancellationToken) {
        loop {
            let Some(boundary) = next_boundary(Utc::now(), period) else {
                warn!(period = %period, "Period has no fixed duration, not scheduling");
                return;
            };
            let fire_at = boundary + self.settle_delay_chrono();
            let wait = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(wait) => {
                    self.publish_period(period, boundary);
                }
            }
        }
    }

    fn settle_delay_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settle_delay).unwrap_or_else(|_| chrono::Duration::zero())
    }
}
