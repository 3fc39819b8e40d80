//! Core types for the storefront backend.
//!
//! This crate holds everything the HTTP layer talks to without knowing how
//! it is implemented:
//!
//! - [`model`]: categories, filters, orders and pagination
//! - [`error`]: the [`StoreError`] taxonomy and its status mapping
//! - [`context`]: request ids and the authenticated user
//! - [`collaborator`]: the [`Controller`], [`IdentityProvider`],
//!   [`Validator`] and [`MetricsSink`] contracts
//! - [`validation`]: the default rule set
//! - [`memory`]: in-process implementations used by the binary and tests
//!
//! # Example
//!
//! ```
//! use storefront_core::{Controller, MemoryStore, Page};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let page: Page<_> = store.list_categories(1, 10).await.unwrap();
//! assert_eq!(page.total, 0);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::future::Future;
use std::pin::Pin;

pub mod collaborator;
pub mod context;
pub mod error;
pub mod memory;
pub mod model;
pub mod validation;

pub use collaborator::{Controller, IdentityProvider, MetricsSink, NoopMetrics, Observation, Validator};
pub use context::{AuthenticatedUser, IdentityError, RequestId};
pub use error::{ErrorKind, FieldErrors, StoreError, StoreResult};
pub use memory::{MemoryIdentity, MemoryStore};
pub use model::{
    Category, Filter, FilterValue, Filters, Order, OrderItem, OrderSort, OrderStatus, Page,
    SortField,
};
pub use validation::RuleValidator;

/// A boxed, sendable future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
