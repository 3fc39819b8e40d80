//! Testing utilities for the storefront backend.
//!
//! [`TestApp`] wires the full route table over recording collaborators and
//! hands out a [`TestClient`] that sends requests through the router and
//! middleware chains in memory, without binding a socket.
//!
//! # Example
//!
//! ```ignore
//! use http::StatusCode;
//! use storefront_test::TestApp;
//!
//! #[tokio::test]
//! async fn short_search_skips_the_controller() {
//!     let app = TestApp::new();
//!     let response = app.client().get("/api/category/search?q=ab").send().await;
//!
//!     response.assert_status(StatusCode::OK);
//!     assert_eq!(app.controller().total_calls(), 0);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod doubles;
mod error;
mod response;

use std::sync::Arc;

use storefront_config::PaginationConfig;
use storefront_server::{App, AppState};

pub use client::{TestClient, TestClientRequest};
pub use doubles::{Call, CreateUserMode, Failure, RecordingController, StubIdentity};
pub use error::TestError;
pub use response::TestResponse;

/// Token that [`TestApp`] registers for [`TestApp::USER_ID`].
pub const USER_TOKEN: &str = "user-token";

/// An application over recording collaborators.
#[derive(Debug)]
pub struct TestApp {
    controller: Arc<RecordingController>,
    identity: Arc<StubIdentity>,
    client: TestClient,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Subject behind [`USER_TOKEN`].
    pub const USER_ID: &'static str = "0190a8a4-62b4-7c3e-9d1e-3f0f6a1b2c3d";

    /// Builds the app with default pagination.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pagination(PaginationConfig::default())
    }

    /// Builds the app with the given pagination defaults.
    #[must_use]
    pub fn with_pagination(pagination: PaginationConfig) -> Self {
        let controller = Arc::new(RecordingController::new());
        let identity = Arc::new(StubIdentity::new());
        identity.register_token(USER_TOKEN, Self::USER_ID);

        let state = AppState::new(controller.clone(), identity.clone()).with_pagination(pagination);
        Self {
            controller,
            identity,
            client: TestClient::new(App::new(state)),
        }
    }

    /// Returns the in-memory client.
    #[must_use]
    pub fn client(&self) -> &TestClient {
        &self.client
    }

    /// Returns the recording controller.
    #[must_use]
    pub fn controller(&self) -> &RecordingController {
        &self.controller
    }

    /// Returns the identity stub.
    #[must_use]
    pub fn identity(&self) -> &StubIdentity {
        &self.identity
    }
}
