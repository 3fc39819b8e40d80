//! Uniform JSON response shapes.
//!
//! Every response body is a JSON object carrying the numeric `status`, plus
//! either `data` or `error`:
//!
//! ```text
//! {"status": 200, "data": ...}
//! {"status": 200, "data": [...], "page": 1, "size": 20, "total": 42}
//! {"status": 404, "error": "category 'boots' not found"}
//! ```
//!
//! Clients can branch on the presence of `error` without reading the status
//! line.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use storefront_core::error::INTERNAL_ERROR_MESSAGE;
use storefront_core::Page;

use crate::types::Response;

#[derive(Serialize)]
struct Success<'a, T: ?Sized> {
    status: u16,
    data: &'a T,
}

#[derive(Serialize)]
struct Paginated<'a, T> {
    status: u16,
    data: &'a [T],
    page: u32,
    size: u32,
    total: u64,
}

#[derive(Serialize)]
struct Failure<'a> {
    status: u16,
    error: &'a str,
}

/// Body used when a payload cannot be serialized.
const SERIALIZE_FAILURE: &[u8] = br#"{"status":500,"error":"internal error"}"#;

fn json_response<B: Serialize>(status: StatusCode, body: &B) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => build(status, Bytes::from(bytes)),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response body");
            build(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(SERIALIZE_FAILURE),
            )
        }
    }
}

fn build(status: StatusCode, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Wraps `payload` as `{status, data}`.
pub fn success<T: Serialize + ?Sized>(status: StatusCode, payload: &T) -> Response {
    json_response(
        status,
        &Success {
            status: status.as_u16(),
            data: payload,
        },
    )
}

/// Wraps a page as `{status, data, page, size, total}`.
pub fn success_paginated<T: Serialize>(status: StatusCode, page: &Page<T>) -> Response {
    json_response(
        status,
        &Paginated {
            status: status.as_u16(),
            data: &page.data,
            page: page.page,
            size: page.size,
            total: page.total,
        },
    )
}

/// Wraps an error message as `{status, error}`.
pub fn error(status: StatusCode, message: &str) -> Response {
    json_response(
        status,
        &Failure {
            status: status.as_u16(),
            error: message,
        },
    )
}

/// The generic 500 response.
pub fn internal_error() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}
