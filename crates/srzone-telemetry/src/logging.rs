//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Single-line human readable output.
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

/// `[logging]` configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format. Unset picks JSON when `RUST_ENV=production`.
    #[serde(default)]
    pub format: Option<LogFormat>,
    /// Filter directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,srzone=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: None,
            filter: default_filter(),
        }
    }
}

/// Effective format: explicit configuration wins over `RUST_ENV`.
pub fn resolve_format(configured: Option<LogFormat>, rust_env: Option<&str>) -> LogFormat {
    match (configured, rust_env) {
        (Some(format), _) => format,
        (None, Some("production")) => LogFormat::Json,
        (None, _) => LogFormat::Pretty,
    }
}

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` overrides the configured filter. Stdout is left to
/// command output.
pub fn init_logging(config: &LoggingConfig) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| TelemetryError::LoggingInit(format!("invalid filter {:?}: {e}", config.filter)))?,
    };

    let rust_env = std::env::var("RUST_ENV").ok();
    let format = resolve_format(config.format, rust_env.as_deref());
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_format_wins() {
        assert_eq!(
            resolve_format(Some(LogFormat::Compact), Some("production")),
            LogFormat::Compact
        );
        assert_eq!(resolve_format(Some(LogFormat::Json), None), LogFormat::Json);
    }

    #[test]
    fn test_rust_env_fallback() {
        assert_eq!(resolve_format(None, Some("production")), LogFormat::Json);
        assert_eq!(resolve_format(None, Some("staging")), LogFormat::Pretty);
        assert_eq!(resolve_format(None, None), LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            filter: "srzone=verbose".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
