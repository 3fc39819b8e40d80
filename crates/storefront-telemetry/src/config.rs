//! Combined telemetry configuration.

use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Logging and metrics settings, as found under `[telemetry]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Log output settings.
    pub logging: LogConfig,
    /// Prometheus exporter settings.
    pub metrics: MetricsConfig,
}
