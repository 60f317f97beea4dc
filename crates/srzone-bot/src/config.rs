//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use srzone_core::Period;
use srzone_detector::DetectorConfig;
use srzone_engine::EngineConfig;
use srzone_telemetry::LoggingConfig;
use std::path::Path;
use std::time::Duration;

/// Zone store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// Process-local store, for development and dry runs.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
        }
    }
}

/// REST market-data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_rest_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl MarketDataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Candle-close event generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_periods")]
    pub periods: Vec<Period>,
    /// Wait after each period boundary before publishing (ms), so the
    /// exchange has finalized the closed candle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Publish one event per (symbol, period) at startup.
    #[serde(default = "default_recompute_on_start")]
    pub recompute_on_start: bool,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_periods() -> Vec<Period> {
    vec![Period::M15, Period::H1, Period::H4]
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_recompute_on_start() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            periods: default_periods(),
            settle_delay_ms: default_settle_delay_ms(),
            recompute_on_start: default_recompute_on_start(),
        }
    }
}

impl SchedulerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// HTTP query API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            port: default_api_port(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.detector.validate()?;
        self.engine.validate()?;

        if self.scheduler.symbols.is_empty() {
            return Err(AppError::Config(
                "scheduler.symbols must not be empty".to_string(),
            ));
        }
        if let Some(period) = self.scheduler.periods.iter().find(|p| p.duration().is_none()) {
            return Err(AppError::Config(format!(
                "scheduler.periods contains unsupported period '{period}'"
            )));
        }
        if self.market_data.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "market_data.request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
