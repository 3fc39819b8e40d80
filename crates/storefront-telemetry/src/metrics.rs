//! Prometheus metrics.
//!
//! The exporter serves the text format on its own listener, separate from
//! the API port. Handlers never touch this module directly: they report
//! through [`storefront_core::MetricsSink`], implemented here by
//! [`PrometheusSink`].

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use http::StatusCode;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use storefront_core::MetricsSink;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of finished requests, labelled by `operation` and `status`.
pub const REQUESTS_TOTAL: &str = "storefront_requests_total";
/// Histogram of handler latency in seconds, labelled by `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "storefront_request_duration_seconds";
/// Gauge of connections currently being served.
pub const IN_FLIGHT_REQUESTS: &str = "storefront_in_flight_requests";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,
    /// Exporter listen address.
    pub addr: String,
    /// Bucket bounds for the duration histogram, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Parses [`addr`](Self::addr).
    pub fn socket_addr(&self) -> TelemetryResult<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", self.addr)))
    }
}

fn builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    let builder = PrometheusBuilder::new();
    if config.duration_buckets.is_empty() {
        return Ok(builder);
    }
    builder
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Installs the global Prometheus recorder and its HTTP listener.
///
/// A disabled config is a no-op.
///
/// # Errors
///
/// `InvalidAddress` when `addr` does not parse, `MetricsInit` when a
/// recorder is already installed or the listener cannot start.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = config.socket_addr()?;
    let handle = builder(config)?
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    describe_metrics();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// Renders the installed recorder in Prometheus text format.
///
/// `None` before [`init_metrics`] has run.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of handled requests");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Handler duration in seconds");
    describe_gauge!(IN_FLIGHT_REQUESTS, "Connections currently being served");
}

/// Records one finished request.
pub fn record_request(operation: &'static str, status: StatusCode, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation,
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "operation" => operation).record(duration.as_secs_f64());
}

/// [`MetricsSink`] backed by whatever global recorder is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn observe_request(&self, duration: Duration, status: StatusCode, op: &'static str) {
        record_request(op, status, duration);
    }
}

/// Holds the in-flight gauge up for its lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
