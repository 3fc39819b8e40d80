//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed or the filter is invalid.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The Prometheus recorder could not be installed.
    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// The metrics listen address does not parse.
    #[error("invalid metrics address: {0}")]
    InvalidAddress(String),
}
