//! # Storefront Server
//!
//! Routes, handlers and the HTTP/1 loop of the storefront backend.
//!
//! ```text
//!  TCP ─▶ Server ─▶ buffer body (limit) ─▶ App ─▶ Router ─▶ Chain ─▶ handler ─▶ Controller
//!                                                     │
//!                                           404 / 405 envelope
//! ```
//!
//! Handlers receive their collaborators through [`AppState`]; nothing is
//! read from globals.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_core::{MemoryIdentity, MemoryStore};
//! use storefront_server::{App, AppState, Server};
//!
//! let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(MemoryIdentity::new()));
//! Server::new(App::new(state), config.server).run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod handlers;
pub mod query;
pub mod routes;
mod server;
pub mod shutdown;
mod state;

pub use error::ServerError;
pub use routes::{build_router, App, NOT_FOUND_MESSAGE, REQUEST_ID_HEADER};
pub use server::Server;
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
pub use state::AppState;
