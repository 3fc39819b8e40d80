//! Request handlers.
//!
//! Every handler follows the same shape: start an [`Observation`], decode
//! and validate input, call one collaborator, then answer through the
//! envelope. Errors are logged at `debug` with the handler's `op` name.
//! Only the error kinds a handler lists are shown to the client; anything
//! else becomes a 500 with a generic body.

pub mod category;
pub mod order;

use http::StatusCode;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use storefront_core::error::INTERNAL_ERROR_MESSAGE;
use storefront_core::{ErrorKind, Observation, StoreError, StoreResult};
use storefront_middleware::{envelope, MiddlewareContext, Request, Response};

/// Decodes the request body as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> StoreResult<T> {
    let body = match request.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    serde_json::from_slice(&body).map_err(StoreError::decode)
}

/// Answers with `err`, exposing it only if its kind is in `surfaced`.
pub(crate) fn fail(
    obs: &mut Observation<'_>,
    ctx: &MiddlewareContext,
    err: &StoreError,
    surfaced: &[ErrorKind],
) -> Response {
    let status = if surfaced.contains(&err.kind()) {
        err.status_code()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    fail_with(obs, ctx, status, err)
}

/// Answers with `err` under a fixed status.
///
/// Server errors never carry the error text.
pub(crate) fn fail_with(
    obs: &mut Observation<'_>,
    ctx: &MiddlewareContext,
    status: StatusCode,
    err: &StoreError,
) -> Response {
    obs.set_status(status);
    tracing::debug!(
        op = obs.op(),
        request_id = %ctx.request_id(),
        status = status.as_u16(),
        error = %err,
        "request failed"
    );
    let message = if status.is_server_error() {
        INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        err.public_message()
    };
    envelope::error(status, &message)
}

/// Kinds every decode-validate-call handler surfaces.
pub(crate) const INPUT_ERRORS: [ErrorKind; 2] = [ErrorKind::Decode, ErrorKind::Validation];
