//! Structured logging.
//!
//! Handlers log handled errors at `debug` with an `op` field naming the
//! operation; infrastructure logs at `info` and above. `RUST_LOG`, when
//! set, overrides the configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Filter directive, e.g. `info` or `storefront_server=debug,info`.
    pub level: String,
    /// Output encoding.
    pub format: LogFormat,
    /// Include the module path of each event.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ..Self::default()
        }
    }
}

/// Builds the event filter: `RUST_LOG` if set, else `level`.
pub fn create_env_filter(level: &str) -> TelemetryResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| TelemetryError::LoggingInit(format!("invalid log level '{level}': {e}"))),
    }
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_format_wire_names() {
        let config: LogConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(serde_json::from_str::<LogConfig>(r#"{"format": "xml"}"#).is_err());
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(create_env_filter("storefront_server=debug,info").is_ok());
    }
}
