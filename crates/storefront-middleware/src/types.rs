//! HTTP types used throughout the chain.

use bytes::Bytes;
use http_body_util::Full;

/// A request with its body fully buffered.
pub type Request = http::Request<Full<Bytes>>;

/// A response with its body fully buffered.
pub type Response = http::Response<Full<Bytes>>;
