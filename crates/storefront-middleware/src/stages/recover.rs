//! Per-request fault boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::context::MiddlewareContext;
use crate::envelope;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Converts a panic anywhere below it into a logged 500 response.
///
/// The fault stays inside the request's own task: other in-flight requests
/// and the server keep running.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverPanic;

impl RecoverPanic {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Middleware for RecoverPanic {
    fn name(&self) -> &'static str {
        "recover_panic"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let request_id = ctx.request_id();
        let path = request.uri().path().to_string();
        Box::pin(async move {
            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    tracing::error!(
                        request_id = %request_id,
                        path = %path,
                        panic = panic_message(payload.as_ref()),
                        "recovered from panic while handling request"
                    );
                    envelope::internal_error()
                }
            }
        })
    }
}
