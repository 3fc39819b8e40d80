//! Interceptor, endpoint and chain primitives.
//!
//! A [`Chain`] is an ordered list of [`Middleware`] in front of one
//! [`Endpoint`]. The first middleware added is the outermost: it sees the
//! request first and the response last. Chains are assembled once when
//! routes are registered and shared by every request on that route.
//!
//! ```
//! use http::Method;
//! use storefront_middleware::stages::{MethodGate, RecoverPanic};
//! use storefront_middleware::{BoxFuture, Chain, Endpoint, MiddlewareContext, Request, Response};
//!
//! struct Hello;
//!
//! impl Endpoint for Hello {
//!     fn call<'a>(&'a self, _ctx: &'a mut MiddlewareContext, _req: Request) -> BoxFuture<'a, Response> {
//!         Box::pin(async { storefront_middleware::envelope::success(http::StatusCode::OK, "hello") })
//!     }
//! }
//!
//! let chain = Chain::builder()
//!     .layer(RecoverPanic::new())
//!     .layer(MethodGate::new([Method::GET]))
//!     .endpoint(Hello);
//!
//! assert_eq!(chain.stage_names(), vec!["recover_panic", "method_not_allowed"]);
//! ```

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

pub use storefront_core::BoxFuture;

/// A request interceptor.
///
/// An implementation either calls `next.run` exactly once and may adjust
/// the response, or short-circuits by returning its own response without
/// calling `next`.
pub trait Middleware: Send + Sync + 'static {
    /// Stable stage name used in logs and chain introspection.
    fn name(&self) -> &'static str;

    /// Handles the request, delegating the rest of the chain to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The terminal request handler of a chain.
pub trait Endpoint: Send + Sync + 'static {
    /// Produces the response for a request that passed every middleware.
    fn call<'a>(&'a self, ctx: &'a mut MiddlewareContext, request: Request) -> BoxFuture<'a, Response>;
}

/// The remainder of a chain, handed to each middleware.
///
/// Consumed by [`Next::run`], so it can be invoked at most once.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Runs the remaining middleware and then the endpoint.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.middlewares.split_first() {
            Some((first, rest)) => {
                let next = Next {
                    middlewares: rest,
                    endpoint: self.endpoint,
                };
                first.process(ctx, request, next).await
            }
            None => self.endpoint.call(ctx, request).await,
        }
    }
}

/// An endpoint backed by a function over shared state.
///
/// The function receives the state by reference, which lets plain `fn`
/// items with an explicit lifetime serve as handlers.
pub struct FnEndpoint<S, F> {
    state: Arc<S>,
    func: F,
}

impl<S, F> FnEndpoint<S, F> {
    /// Binds `func` to `state`.
    pub fn new(state: Arc<S>, func: F) -> Self {
        Self { state, func }
    }
}

impl<S, F> Endpoint for FnEndpoint<S, F>
where
    S: Send + Sync + 'static,
    F: for<'a> Fn(&'a S, &'a mut MiddlewareContext, Request) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut MiddlewareContext, request: Request) -> BoxFuture<'a, Response> {
        (self.func)(&self.state, ctx, request)
    }
}

/// An ordered middleware list in front of an endpoint.
#[derive(Clone)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
    endpoint: Arc<dyn Endpoint>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Chain {
    /// Starts an empty chain.
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Returns the middleware names, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Runs a request through the chain.
    pub async fn handle(&self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        Next {
            middlewares: &self.middlewares,
            endpoint: self.endpoint.as_ref(),
        }
        .run(ctx, request)
        .await
    }
}

impl Endpoint for Chain {
    fn call<'a>(&'a self, ctx: &'a mut MiddlewareContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(self.handle(ctx, request))
    }
}

/// Builder for [`Chain`].
#[derive(Default)]
pub struct ChainBuilder {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl ChainBuilder {
    /// Appends a middleware inside the ones already added.
    #[must_use]
    pub fn layer(self, middleware: impl Middleware) -> Self {
        self.layer_shared(Arc::new(middleware))
    }

    /// Appends a middleware instance that other chains also use.
    #[must_use]
    pub fn layer_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Finishes the chain with its endpoint.
    pub fn endpoint(self, endpoint: impl Endpoint) -> Chain {
        self.endpoint_shared(Arc::new(endpoint))
    }

    /// Finishes the chain with a shared endpoint.
    pub fn endpoint_shared(self, endpoint: Arc<dyn Endpoint>) -> Chain {
        Chain {
            middlewares: self.middlewares,
            endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope;
    use http::StatusCode;
    use parking_lot::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Tag {
        name: &'static str,
        trace: Trace,
    }

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.trace.lock().push(format!("{}:in", self.name));
                let response = next.run(ctx, request).await;
                self.trace.lock().push(format!("{}:out", self.name));
                response
            })
        }
    }

    struct Stop;

    impl Middleware for Stop {
        fn name(&self) -> &'static str {
            "stop"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut MiddlewareContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async { envelope::error(StatusCode::FORBIDDEN, "stopped") })
        }
    }

    struct Record(Trace);

    impl Endpoint for Record {
        fn call<'a>(&'a self, _ctx: &'a mut MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.0.lock().push("endpoint".to_string());
                envelope::success(StatusCode::OK, "done")
            })
        }
    }

    fn request() -> Request {
        http::Request::new(http_body_util::Full::default())
    }

    fn tag(name: &'static str, trace: &Trace) -> Tag {
        Tag {
            name,
            trace: Arc::clone(trace),
        }
    }

    #[tokio::test]
    async fn test_first_layer_is_outermost() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .layer(tag("outer", &trace))
            .layer(tag("inner", &trace))
            .endpoint(Record(Arc::clone(&trace)));

        let response = chain.handle(&mut MiddlewareContext::new(), request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *trace.lock(),
            vec!["outer:in", "inner:in", "endpoint", "inner:out", "outer:out"]
        );
        assert_eq!(chain.stage_names(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_endpoint() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .layer(tag("outer", &trace))
            .layer(Stop)
            .endpoint(Record(Arc::clone(&trace)));

        let response = chain.handle(&mut MiddlewareContext::new(), request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(*trace.lock(), vec!["outer:in", "outer:out"]);
    }

    #[tokio::test]
    async fn test_chain_nests_as_endpoint() {
        let trace = Trace::default();
        let inner = Chain::builder()
            .layer(tag("inner", &trace))
            .endpoint(Record(Arc::clone(&trace)));
        let outer = Chain::builder().layer(tag("outer", &trace)).endpoint(inner);

        outer.handle(&mut MiddlewareContext::new(), request()).await;
        assert_eq!(
            *trace.lock(),
            vec!["outer:in", "inner:in", "endpoint", "inner:out", "outer:out"]
        );
    }

    #[tokio::test]
    async fn test_fn_endpoint_sees_state() {
        fn greet<'a>(
            state: &'a String,
            _ctx: &'a mut MiddlewareContext,
            _request: Request,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move { envelope::success(StatusCode::OK, state.as_str()) })
        }

        let chain = Chain::builder().endpoint(FnEndpoint::new(Arc::new("hi".to_string()), greet));
        let response = chain.handle(&mut MiddlewareContext::new(), request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(chain.stage_names().is_empty());
    }
}
