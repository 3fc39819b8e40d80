//! Buffered response with envelope accessors.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use storefront_middleware::Response;

use crate::error::TestError;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads `response` to the end.
    pub async fn from_http(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as text.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| TestError::BodyRead(e.to_string()))
    }

    /// Decodes the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the whole body as a JSON value.
    pub fn envelope(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Decodes the envelope's `data` field.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        let mut envelope = self.envelope()?;
        match envelope.get_mut("data").map(Value::take) {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => Err(TestError::BodyRead(format!("no data field in {envelope}"))),
        }
    }

    /// Returns the envelope's `error` text, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let envelope = self.envelope().ok()?;
        envelope.get("error")?.as_str().map(str::to_string)
    }

    /// Asserts the status and returns `self`.
    ///
    /// # Panics
    ///
    /// When the status differs; the message includes the body.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}
