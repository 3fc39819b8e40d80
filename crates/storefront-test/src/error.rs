//! Test error types.

use thiserror::Error;

/// Errors raised by the test client.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be assembled.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// The body is not what the caller asked for.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
