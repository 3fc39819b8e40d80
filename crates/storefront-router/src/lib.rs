//! Segment tree router for the storefront HTTP surface.
//!
//! Routes are stored in a tree keyed by path segment. Each registered path
//! owns a [`MethodRouter`] that maps HTTP methods to an arbitrary routed
//! value `T` (the server stores its per-route middleware chains here).
//!
//! Two styles of routing are supported:
//!
//! - **Pattern routing**: named variables (`/api/category/{slug}`) and
//!   trailing catch-alls (`/api/order/*rest`).
//! - **Manual method dispatch**: a path can register a value with
//!   [`MethodRouter::any`], leaving the method switch to the routed value.
//!
//! Lookups distinguish a matched route from a known path that rejects the
//! method, and from an unknown path:
//!
//! ```rust
//! use storefront_router::{Lookup, MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/api/category", MethodRouter::new().get("list").post("create"));
//! router.insert("/api/category/{slug}", MethodRouter::new().get("get"));
//!
//! match router.at(&Method::GET, "/api/category/shoes") {
//!     Lookup::Matched { value, params } => {
//!         assert_eq!(*value, "get");
//!         assert_eq!(params.get("slug"), Some("shoes"));
//!     }
//!     other => panic!("unexpected lookup: {other:?}"),
//! }
//!
//! assert!(matches!(
//!     router.at(&Method::PATCH, "/api/category"),
//!     Lookup::MethodNotAllowed { .. }
//! ));
//! assert!(matches!(router.at(&Method::GET, "/api/nope"), Lookup::NotFound));
//! ```
//!
//! # Priority
//!
//! ```text
//!                 (root)
//!                   │
//!                 "api"
//!                   │
//!           ┌───────┴────────┐
//!      "category"         "order"
//!       │      │          │      │
//!  "search" "{slug}"    "me"  "*rest"
//! ```
//!
//! Static segments win over `{param}` segments, which win over `*wildcard`
//! segments. A failed deeper match backtracks to the next candidate. A
//! candidate whose path matches but which has no value for the request
//! method also counts as a miss, so `PUT /api/category/search` reaches
//! `{slug}`. The methods of every skipped candidate make up the `allowed`
//! list when nothing matches.

#![doc(html_root_url = "https://docs.rs/storefront-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod method_router;
mod node;
mod params;
mod router;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::{Lookup, Router};
