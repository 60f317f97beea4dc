//! Application wiring and lifecycle.

use crate::api::{self, ApiState};
use crate::binance::BinanceClient;
use crate::config::{AppConfig, StoreBackend, StoreConfig};
use crate::error::AppResult;
use crate::scheduler::CandleCloseScheduler;
use chrono::Utc;
use srzone_core::{CandleClosed, NearestZones, Period};
use srzone_detector::ZoneDetector;
use srzone_engine::{EventBus, Providers, RecomputeOrchestrator};
use srzone_persistence::{MemoryZoneStore, RedisZoneStore, ZoneStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Candle-close events buffered per subscriber.
const EVENT_BUS_CAPACITY: usize = 1024;

/// Open the configured zone store.
pub async fn open_store(config: &StoreConfig) -> AppResult<Arc<dyn ZoneStore>> {
    let store: Arc<dyn ZoneStore> = match config.backend {
        StoreBackend::Redis => Arc::new(RedisZoneStore::connect(&config.redis_url).await?),
        StoreBackend::Memory => {
            warn!("Using in-memory zone store; zones are lost on exit");
            Arc::new(MemoryZoneStore::new())
        }
    };
    info!(backend = store.backend_type(), "Zone store ready");
    Ok(store)
}

pub struct Application {
    config: AppConfig,
    store: Arc<dyn ZoneStore>,
}

impl Application {
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let store = open_store(&config.store).await?;
        Ok(Self { config, store })
    }

    /// Nearest support and resistance for `price` from the stored set.
    pub async fn nearest(&self, symbol: &str, period: &Period, price: f64) -> AppResult<NearestZones> {
        Ok(self.store.get_nearest_zones(symbol, period, price).await?)
    }

    /// Run until Ctrl-C, then stop components in dependency order.
    pub async fn run(self) -> AppResult<()> {
        let market_data = Arc::new(BinanceClient::new(&self.config.market_data)?);
        let providers = Providers {
            candles: market_data.clone(),
            order_books: market_data.clone(),
            volume: market_data,
        };

        let orchestrator = RecomputeOrchestrator::new(
            self.config.engine.clone(),
            ZoneDetector::new(self.config.detector.clone()),
            Arc::clone(&self.store),
            providers,
        );
        let bus: EventBus<CandleClosed> = EventBus::new(EVENT_BUS_CAPACITY);
        orchestrator.start(&bus)?;

        let cancel = CancellationToken::new();

        let api_handle = if self.config.api.enabled {
            let listener = api::bind(self.config.api.port).await?;
            let state = ApiState::new(Arc::clone(&self.store));
            Some(tokio::spawn(api::serve(listener, state, cancel.child_token())))
        } else {
            None
        };

        let scheduler = CandleCloseScheduler::new(&self.config.scheduler, bus.clone());
        if self.config.scheduler.recompute_on_start {
            let published = scheduler.publish_all(Utc::now());
            info!(events = published, "Initial recompute requested");
        }
        let scheduler_handle = scheduler.spawn(cancel.child_token());

        info!(
            symbols = ?self.config.scheduler.symbols,
            store = self.store.backend_type(),
            "Zone service running"
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");

        // Stop producing events before draining the consumer.
        cancel.cancel();
        if let Err(e) = scheduler_handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        orchestrator.shutdown().await;

        if let Some(handle) = api_handle {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Query API stopped with error"),
                Err(e) => warn!(error = %e, "Query API task ended abnormally"),
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_opens_without_server() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend_type(), "memory");
    }

    #[tokio::test]
    async fn test_nearest_on_empty_store() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Memory;
        let app = Application::new(config).await.unwrap();

        let nearest = app.nearest("BTCUSDT", &Period::H1, 100.0).await.unwrap();
        assert!(nearest.support.is_none());
        assert!(nearest.resistance.is_none());
        assert_eq!(nearest.dist_to_support_pct, 0.0);
    }
}
