//! # Storefront Middleware
//!
//! Response envelope and per-route middleware chains.
//!
//! Each route owns a [`Chain`]: an explicit, ordered list of
//! [`Middleware`] in front of an [`Endpoint`]. The first entry is the
//! outermost, so a route registered as
//!
//! ```text
//! RecoverPanic → MethodGate(GET) → Authenticate → endpoint
//! ```
//!
//! recovers from faults in every later stage, rejects wrong methods before
//! spending an identity lookup, and only then authenticates.
//!
//! Every response produced here is shaped by [`envelope`].

#![doc(html_root_url = "https://docs.rs/storefront-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod envelope;
pub mod middleware;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Chain, ChainBuilder, Endpoint, FnEndpoint, Middleware, Next};
pub use stages::{bearer_token, BEARER_PREFIX};
pub use types::{Request, Response};
