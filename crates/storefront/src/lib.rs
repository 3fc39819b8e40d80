//! # Storefront
//!
//! Catalog and order HTTP backend.
//!
//! Categories with their filters are public to read and need a bearer token
//! to change. Orders can be placed anonymously: a guest account is
//! provisioned with the identity provider on the fly. Every response,
//! errors included, is a JSON envelope:
//!
//! ```text
//! {"status": 200, "data": ...}
//! {"status": 200, "data": [...], "page": 1, "size": 40, "total": 93}
//! {"status": 404, "error": "category 'boots' not found"}
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("STOREFRONT").load()?;
//!     let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(MemoryIdentity::new()));
//!     Server::new(App::new(state), config.server).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/storefront/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use storefront_config as config;
pub use storefront_core as core;
pub use storefront_middleware as middleware;
pub use storefront_router as router;
pub use storefront_server as server;
pub use storefront_telemetry as telemetry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use storefront_config::{ConfigLoader, PaginationConfig, ServerConfig, StorefrontConfig};
    pub use storefront_core::{
        Category, Controller, ErrorKind, Filter, IdentityProvider, MemoryIdentity, MemoryStore,
        MetricsSink, Order, OrderStatus, Page, RuleValidator, StoreError, StoreResult, Validator,
    };
    pub use storefront_server::{App, AppState, Server, ShutdownSignal};
    pub use storefront_telemetry::{init_telemetry, PrometheusSink};
}
