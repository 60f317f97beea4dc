//! Candle-close driven zone recompute orchestration.
//!
//! Every `CandleClosed` event triggers one recompute for its
//! (symbol, period) key:
//! 1. fetch candle history
//! 2. drop the recompute if history is short
//! 3. detect zones
//! 4. enrich with the cached order book and 24h volume
//! 5. replace the stored zone set
//!
//! Recomputes run on their own tasks so the listener never blocks. At
//! most `max_concurrent_recomputes` run at once. Events for a key that is
//! already being recomputed are coalesced into a single rerun, so writes
//! for one key never overlap.
//!
//! Failures are logged and recorded in metrics; nothing is retried.

use crate::book_cache::OrderBookCache;
use crate::bus::{EventBus, RecvError};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::provider::{CandleProvider, OrderBookProvider, VolumeProvider};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use srzone_core::{CandleClosed, Period, ZoneKey, ZoneType};
use srzone_detector::ZoneDetector;
use srzone_persistence::ZoneStore;
use srzone_telemetry::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// External data sources used by a recompute.
#[derive(Clone)]
pub struct Providers {
    pub candles: Arc<dyn CandleProvider>,
    pub order_books: Arc<dyn OrderBookProvider>,
    pub volume: Arc<dyn VolumeProvider>,
}

/// How a single recompute ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// Zone set replaced with this many zones.
    Saved(usize),
    /// Candle provider failed.
    HistoryFailed,
    /// Fewer candles than required.
    InsufficientData(usize),
    /// Detector found nothing; the stored set is left untouched.
    NoZones,
    /// Store write failed.
    SaveFailed,
    /// Shutdown was requested before the recompute finished its fetches.
    Cancelled,
}

impl RecomputeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved(_) => "saved",
            Self::HistoryFailed => "history_failed",
            Self::InsufficientData(_) => "insufficient_data",
            Self::NoZones => "no_zones",
            Self::SaveFailed => "save_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

struct Inner {
    config: EngineConfig,
    detector: ZoneDetector,
    store: Arc<dyn ZoneStore>,
    providers: Providers,
    book_cache: OrderBookCache,
    /// Keys with a running task; `true` means another event arrived
    /// while it was running.
    in_flight: DashMap<ZoneKey, bool>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
}

/// Subscribes to candle-close events and keeps stored zone sets current.
pub struct RecomputeOrchestrator {
    inner: Arc<Inner>,
    tracker: TaskTracker,
    listener_stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RecomputeOrchestrator {
    pub fn new(
        config: EngineConfig,
        detector: ZoneDetector,
        store: Arc<dyn ZoneStore>,
        providers: Providers,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let inner = Inner {
            book_cache: OrderBookCache::new(config.order_book_ttl()),
            permits: Arc::new(Semaphore::new(config.max_concurrent_recomputes.max(1))),
            in_flight: DashMap::new(),
            config,
            detector,
            store,
            providers,
            shutdown: shutdown.clone(),
        };
        Self {
            inner: Arc::new(inner),
            tracker: TaskTracker::new(),
            listener_stop: shutdown.child_token(),
            listener: Mutex::new(None),
        }
    }

    /// Start consuming candle-close events from `bus`.
    pub fn start(&self, bus: &EventBus<CandleClosed>) -> EngineResult<()> {
        if self.inner.shutdown.is_cancelled() {
            return Err(EngineError::ShuttingDown);
        }
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return Err(EngineError::AlreadyStarted);
        }

        let mut events = bus.subscribe();
        let stop = self.listener_stop.clone();
        let inner = Arc::clone(&self.inner);
        let tracker = self.tracker.clone();

        *listener = Some(tokio::spawn(async move {
            info!("Candle-close listener started");
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            dispatch(&inner, &tracker, event);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Candle-close listener lagged, events dropped");
                        }
                        Err(RecvError::Closed) => {
                            info!("Event bus closed");
                            break;
                        }
                    }
                }
            }
            info!("Candle-close listener stopped");
        }));

        Ok(())
    }

    /// Schedule a recompute for the event's key.
    ///
    /// Returns `true` if a new recompute task was spawned, `false` if the
    /// event was coalesced into a running one or shutdown has begun.
    pub fn dispatch(&self, event: CandleClosed) -> bool {
        dispatch(&self.inner, &self.tracker, event)
    }

    /// Run one recompute inline, bypassing dispatch and coalescing.
    pub async fn recompute_now(&self, symbol: &str, period: &Period) -> RecomputeOutcome {
        run_once(&self.inner, &ZoneKey::new(symbol, period.clone())).await
    }

    /// Keys with a recompute currently running or queued for a permit.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    pub fn book_cache(&self) -> &OrderBookCache {
        &self.inner.book_cache
    }

    /// Stop accepting events and wait for outstanding work.
    ///
    /// Recomputes that have not finished their fetches are abandoned;
    /// ones already writing run to completion.
    pub async fn shutdown(&self) {
        info!("Recompute orchestrator shutdown requested");

        self.listener_stop.cancel();
        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            if let Err(e) = handle.await {
                error!(error = %e, "Candle-close listener panicked");
            }
        }

        self.inner.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        info!("Recompute orchestrator stopped");
    }
}

fn dispatch(inner: &Arc<Inner>, tracker: &TaskTracker, event: CandleClosed) -> bool {
    if inner.shutdown.is_cancelled() {
        debug!(symbol = %event.symbol, period = %event.period, "Event ignored during shutdown");
        return false;
    }

    let key = ZoneKey::new(event.symbol, event.period);
    match inner.in_flight.entry(key.clone()) {
        Entry::Occupied(mut running) => {
            *running.get_mut() = true;
            debug!(key = %key, "Recompute already running, coalesced");
            Metrics::event_coalesced();
            return false;
        }
        Entry::Vacant(slot) => {
            slot.insert(false);
        }
    }

    let mut slot = InFlightSlot {
        inner: Arc::clone(inner),
        key,
        released: false,
    };
    tracker.spawn(async move {
        loop {
            run_once(&slot.inner, &slot.key).await;
            if !slot.take_rerun() {
                break;
            }
            debug!(key = %slot.key, "Rerunning coalesced recompute");
        }
    });
    true
}

/// A key's `in_flight` entry, owned by the task recomputing it.
///
/// Dropping an unreleased slot removes the entry, so a task that panics
/// does not leave its key coalescing forever.
struct InFlightSlot {
    inner: Arc<Inner>,
    key: ZoneKey,
    released: bool,
}

impl InFlightSlot {
    /// Consume a pending rerun request, or release the key when there is none.
    fn take_rerun(&mut self) -> bool {
        match self.inner.in_flight.entry(self.key.clone()) {
            Entry::Occupied(mut running) => {
                if *running.get() && !self.inner.shutdown.is_cancelled() {
                    *running.get_mut() = false;
                    return true;
                }
                running.remove();
            }
            Entry::Vacant(_) => {}
        }
        self.released = true;
        false
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        if !self.released {
            warn!(key = %self.key, "Recompute task ended abnormally, releasing key");
            self.inner.in_flight.remove(&self.key);
        }
    }
}

async fn run_once(inner: &Inner, key: &ZoneKey) -> RecomputeOutcome {
    let permit = tokio::select! {
        _ = inner.shutdown.cancelled() => return RecomputeOutcome::Cancelled,
        permit = Arc::clone(&inner.permits).acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return RecomputeOutcome::Cancelled,
        },
    };

    Metrics::recompute_started();
    let started = Instant::now();
    let outcome = inner.recompute(&key.symbol, &key.period).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    Metrics::recompute_ended();
    Metrics::recompute_finished(key.period.as_str(), outcome.as_str(), latency_ms);
    drop(permit);

    outcome
}

impl Inner {
    async fn recompute(&self, symbol: &str, period: &Period) -> RecomputeOutcome {
        if self.shutdown.is_cancelled() {
            return RecomputeOutcome::Cancelled;
        }

        let candles = match self
            .providers
            .candles
            .get_history(symbol, period, self.config.history_limit)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!(symbol = %symbol, period = %period, error = %e, "Failed to fetch candle history");
                return RecomputeOutcome::HistoryFailed;
            }
        };

        if candles.len() < self.config.min_candles {
            debug!(
                symbol = %symbol,
                period = %period,
                candles = candles.len(),
                required = self.config.min_candles,
                "Not enough candles, skipping recompute"
            );
            return RecomputeOutcome::InsufficientData(candles.len());
        }

        let zones = self.detector.find_zones(symbol, period, &candles);
        if zones.is_empty() {
            debug!(symbol = %symbol, period = %period, "No zones detected");
            return RecomputeOutcome::NoZones;
        }

        if self.shutdown.is_cancelled() {
            return RecomputeOutcome::Cancelled;
        }

        let zones = match self
            .book_cache
            .get_or_fetch(
                symbol,
                self.providers.order_books.as_ref(),
                self.config.order_book_depth,
            )
            .await
        {
            Ok(book) => match self.providers.volume.volume_24h_usd(symbol).await {
                Ok(volume_24h_usd) => {
                    self.detector
                        .enrich_with_order_book(zones, Some(book.as_ref()), volume_24h_usd)
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Failed to fetch 24h volume, skipping wall detection");
                    zones
                }
            },
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to fetch order book, skipping wall detection");
                zones
            }
        };

        if let Err(e) = self.store.save_zones(symbol, period, &zones).await {
            warn!(symbol = %symbol, period = %period, error = %e, "Failed to save zones");
            return RecomputeOutcome::SaveFailed;
        }

        let supports = zones.iter().filter(|z| z.zone_type == ZoneType::Support).count();
        let resistances = zones.len() - supports;
        Metrics::zones_persisted(period.as_str(), ZoneType::Support.as_str(), supports);
        Metrics::zones_persisted(period.as_str(), ZoneType::Resistance.as_str(), resistances);

        info!(
            symbol = %symbol,
            period = %period,
            zones = zones.len(),
            supports,
            resistances,
            walls = zones.iter().filter(|z| z.has_order_wall).count(),
            "Zones recomputed"
        );
        RecomputeOutcome::Saved(zones.len())
    }
}
