//! Structured logging and Prometheus metrics for the storefront backend.
//!
//! - [`logging`]: `tracing-subscriber` set-up, JSON or pretty output
//! - [`metrics`]: Prometheus exporter and the [`PrometheusSink`] request
//!   observer
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `storefront_requests_total` | Counter | `operation`, `status` |
//! | `storefront_request_duration_seconds` | Histogram | `operation` |
//! | `storefront_in_flight_requests` | Gauge | - |
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::default())?;
//! tracing::info!("telemetry ready");
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig, PrometheusSink};

/// Result alias for telemetry set-up.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and then metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
