//! Method gating.

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use storefront_core::StoreError;

use crate::context::MiddlewareContext;
use crate::envelope;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Rejects any method outside a fixed set with 405 before the rest of the
/// chain runs.
#[derive(Debug, Clone)]
pub struct MethodGate {
    allowed: Vec<Method>,
    allow_header: Option<HeaderValue>,
}

impl MethodGate {
    /// Creates a gate accepting exactly `methods`.
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let allowed: Vec<Method> = methods.into_iter().collect();
        let joined = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            allow_header: HeaderValue::from_str(&joined).ok(),
            allowed,
        }
    }

    /// Returns true if `method` passes the gate.
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        self.allowed.contains(method)
    }
}

impl Middleware for MethodGate {
    fn name(&self) -> &'static str {
        "method_not_allowed"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if self.accepts(request.method()) {
                return next.run(ctx, request).await;
            }

            tracing::debug!(
                request_id = %ctx.request_id(),
                method = %request.method(),
                "method rejected"
            );
            let mut response = envelope::error(
                StatusCode::METHOD_NOT_ALLOWED,
                &StoreError::MethodNotAllowed.public_message(),
            );
            if let Some(allow) = &self.allow_header {
                response.headers_mut().insert(ALLOW, allow.clone());
            }
            response
        })
    }
}
