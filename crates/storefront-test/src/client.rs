//! In-memory client driving an [`App`] without a socket.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use http_body_util::Full;
use serde::Serialize;
use storefront_middleware::Request;
use storefront_server::App;

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight into the router and middleware chains.
///
/// ```ignore
/// let client = TestClient::new(app);
/// let response = client.get("/api/category?page=2").send().await;
/// response.assert_status(StatusCode::OK);
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Arc<App>,
}

impl TestClient {
    /// Wraps an application.
    #[must_use]
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Returns the application.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Starts a GET request.
    pub fn get(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: &str) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }
}

/// A request being built against a [`TestClient`].
#[derive(Debug)]
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    error: Option<TestError>,
}

impl<'a> TestClientRequest<'a> {
    /// Adds a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            _ => self.error = Some(TestError::RequestBuild(format!("bad header {name}: {value}"))),
        }
        self
    }

    /// Adds `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.header(CONTENT_TYPE.as_str(), "application/json")
            }
            Err(err) => {
                self.error = Some(TestError::Json(err));
                self
            }
        }
    }

    fn build(self) -> Result<(&'a TestClient, Request), TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut builder = http::Request::builder().method(self.method).uri(&self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        Ok((self.client, request))
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// When the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Sends the request, reporting build failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let (client, request) = self.build()?;
        Ok(TestResponse::from_http(client.app.handle(request).await).await)
    }
}
