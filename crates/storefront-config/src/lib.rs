//! Layered configuration for the storefront backend.
//!
//! Defaults, then an optional TOML or JSON file, then
//! `STOREFRONT__SECTION__KEY` environment variables. Unknown fields in a
//! file are rejected.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [pagination]
//! default_page = 1
//! default_page_size = 40
//! search_page = 1
//! search_page_size = 10
//! min_search_len = 3
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{PaginationConfig, ServerConfig, StorefrontConfig};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use storefront_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
