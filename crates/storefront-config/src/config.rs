//! Configuration types.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_telemetry::TelemetryConfig;

use crate::ConfigError;

/// Root configuration.
///
/// ```
/// use storefront_config::StorefrontConfig;
///
/// let config = StorefrontConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.pagination.default_page_size, 40);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorefrontConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Page and search defaults handed to handlers.
    pub pagination: PaginationConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl StorefrontConfig {
    /// Debug-level pretty logs and no metrics listener.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging = storefront_telemetry::LogConfig::development();
        config.telemetry.metrics.enabled = false;
        config
    }

    /// Checks cross-field rules that serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be at least 1",
            ));
        }

        if self.telemetry.metrics.enabled {
            self.telemetry.metrics.socket_addr().map_err(|e| {
                ConfigError::invalid_value("telemetry.metrics.addr", e.to_string())
            })?;
        }

        let p = &self.pagination;
        for (field, value) in [
            ("pagination.default_page", p.default_page),
            ("pagination.default_page_size", p.default_page_size),
            ("pagination.search_page", p.search_page),
            ("pagination.search_page_size", p.search_page_size),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be at least 1"));
            }
        }

        Ok(())
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// API listen address.
    pub http_addr: String,
    /// Grace period for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Largest accepted request body; larger bodies get 413.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Parses [`http_addr`](Self::http_addr).
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.http_addr),
            )
        })
    }

    /// The shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Page and search defaults.
///
/// Handlers fall back to these whenever a `page` or `size` query value is
/// absent, unparsable or below 1. A search query shorter than
/// `min_search_len` characters returns an empty page without touching the
/// controller; 0 turns that guard off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page for listings.
    pub default_page: u32,
    /// Page size for listings.
    pub default_page_size: u32,
    /// Page for search endpoints.
    pub search_page: u32,
    /// Page size for search endpoints.
    pub search_page_size: u32,
    /// Shortest query, in characters, that reaches the controller.
    pub min_search_len: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 40,
            search_page: 1,
            search_page_size: 10,
            min_search_len: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(StorefrontConfig::default().validate().is_ok());
        assert!(StorefrontConfig::development().validate().is_ok());
    }

    #[test]
    fn test_bad_http_addr() {
        let mut config = StorefrontConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = StorefrontConfig::default();
        config.pagination.search_page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pagination.search_page_size"));
    }

    #[test]
    fn test_zero_min_search_len_allowed() {
        let mut config = StorefrontConfig::default();
        config.pagination.min_search_len = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_addr_checked_only_when_enabled() {
        let mut config = StorefrontConfig::default();
        config.telemetry.metrics.addr = "nope".to_string();
        assert!(config.validate().is_err());

        config.telemetry.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shutdown_timeout() {
        assert_eq!(ServerConfig::default().shutdown_timeout(), Duration::from_secs(30));
    }
}
