//! Route table and request dispatch.
//!
//! | Method | Path | Chain |
//! |---|---|---|
//! | GET | `/api/category` | recover |
//! | POST | `/api/category` | recover, auth |
//! | GET | `/api/category/search` | recover |
//! | GET | `/api/category/filters/search` | recover |
//! | GET | `/api/category/{slug}` | recover |
//! | PUT, DELETE | `/api/category/{slug}` | recover, auth |
//! | GET | `/api/category/{slug}/filters` | recover |
//! | GET | `/api/order/me` | recover, method gate, auth |
//! | any | `/api/order` | recover, then GET: auth / POST: open |
//! | any | `/api/order/{id}` | recover, then GET, PUT, DELETE: auth |
//!
//! The two order resources dispatch on the method themselves, so a wrong
//! method there is answered inside the chain rather than by the router.

use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use storefront_core::{RequestId, StoreError};
use storefront_middleware::stages::{Authenticate, MethodGate, RecoverPanic};
use storefront_middleware::{
    envelope, BoxFuture, Chain, Endpoint, FnEndpoint, Middleware, MiddlewareContext, Request,
    Response,
};
use storefront_router::{Lookup, MethodRouter, Router};

use crate::handlers::{category, order};
use crate::state::AppState;

/// Header carrying the request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Body of the 404 for unknown paths.
pub const NOT_FOUND_MESSAGE: &str = "not found";

/// Builds a 405 listing `allowed` in the `Allow` header.
pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut response = envelope::error(
        StatusCode::METHOD_NOT_ALLOWED,
        &StoreError::MethodNotAllowed.to_string(),
    );
    let joined = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&joined) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Sets the request id header.
pub fn stamp_request_id(response: &mut Response, request_id: RequestId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
}

/// Picks an inner chain by request method.
struct MethodSwitch {
    arms: Vec<(Method, Chain)>,
}

impl MethodSwitch {
    fn new() -> Self {
        Self { arms: Vec::new() }
    }

    fn on(mut self, method: Method, chain: Chain) -> Self {
        self.arms.push((method, chain));
        self
    }
}

impl Endpoint for MethodSwitch {
    fn call<'a>(&'a self, ctx: &'a mut MiddlewareContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.arms.iter().find(|(m, _)| m == request.method()) {
                Some((_, chain)) => chain.handle(ctx, request).await,
                None => {
                    let allowed: Vec<Method> = self.arms.iter().map(|(m, _)| m.clone()).collect();
                    method_not_allowed(&allowed)
                }
            }
        })
    }
}

/// Builds route chains over one state and one shared auth stage.
struct RouteBuilder {
    state: Arc<AppState>,
    auth: Arc<dyn Middleware>,
}

impl RouteBuilder {
    fn endpoint<F>(&self, handler: F) -> FnEndpoint<AppState, F> {
        FnEndpoint::new(Arc::clone(&self.state), handler)
    }

    /// `RecoverPanic → handler`
    fn open<F>(&self, handler: F) -> Chain
    where
        F: for<'a> Fn(&'a AppState, &'a mut MiddlewareContext, Request) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Chain::builder().layer(RecoverPanic).endpoint(self.endpoint(handler))
    }

    /// `RecoverPanic → Authenticate → handler`
    fn guarded<F>(&self, handler: F) -> Chain
    where
        F: for<'a> Fn(&'a AppState, &'a mut MiddlewareContext, Request) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Chain::builder()
            .layer(RecoverPanic)
            .layer_shared(Arc::clone(&self.auth))
            .endpoint(self.endpoint(handler))
    }

    /// `Authenticate → handler`, for arms behind an outer recover stage.
    fn authed_arm<F>(&self, handler: F) -> Chain
    where
        F: for<'a> Fn(&'a AppState, &'a mut MiddlewareContext, Request) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Chain::builder()
            .layer_shared(Arc::clone(&self.auth))
            .endpoint(self.endpoint(handler))
    }

    /// `handler` alone, for arms behind an outer recover stage.
    fn open_arm<F>(&self, handler: F) -> Chain
    where
        F: for<'a> Fn(&'a AppState, &'a mut MiddlewareContext, Request) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Chain::builder().endpoint(self.endpoint(handler))
    }

    fn switch(switch: MethodSwitch) -> Chain {
        Chain::builder().layer(RecoverPanic).endpoint(switch)
    }
}

/// Registers every route.
pub fn build_router(state: &Arc<AppState>) -> Router<Chain> {
    let routes = RouteBuilder {
        state: Arc::clone(state),
        auth: Arc::new(Authenticate::new(Arc::clone(&state.identity))),
    };
    let mut router = Router::new();

    router.insert(
        "/api/category",
        MethodRouter::new()
            .get(routes.open(category::list))
            .post(routes.guarded(category::create)),
    );
    router.route(Method::GET, "/api/category/search", routes.open(category::search));
    router.route(
        Method::GET,
        "/api/category/filters/search",
        routes.open(category::filters_search),
    );
    router.insert(
        "/api/category/{slug}",
        MethodRouter::new()
            .get(routes.open(category::get))
            .put(routes.guarded(category::update))
            .delete(routes.guarded(category::delete)),
    );
    router.route(
        Method::GET,
        "/api/category/{slug}/filters",
        routes.open(category::list_filters),
    );

    router.insert(
        "/api/order/me",
        MethodRouter::new().any(
            Chain::builder()
                .layer(RecoverPanic)
                .layer(MethodGate::new([Method::GET]))
                .layer_shared(Arc::clone(&routes.auth))
                .endpoint(routes.endpoint(order::list_mine)),
        ),
    );
    router.insert(
        "/api/order",
        MethodRouter::new().any(RouteBuilder::switch(
            MethodSwitch::new()
                .on(Method::GET, routes.authed_arm(order::list))
                .on(Method::POST, routes.open_arm(order::create)),
        )),
    );
    router.insert(
        "/api/order/*id",
        MethodRouter::new().any(RouteBuilder::switch(
            MethodSwitch::new()
                .on(Method::GET, routes.authed_arm(order::get))
                .on(Method::PUT, routes.authed_arm(order::update))
                .on(Method::DELETE, routes.authed_arm(order::cancel)),
        )),
    );

    router
}

/// The routed application: what the transport calls for every request.
#[derive(Debug)]
pub struct App {
    router: Router<Chain>,
    state: Arc<AppState>,
}

impl App {
    /// Builds the route table over `state`.
    pub fn new(state: AppState) -> Self {
        let state = Arc::new(state);
        Self {
            router: build_router(&state),
            state,
        }
    }

    /// Returns the shared state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router<Chain> {
        &self.router
    }

    /// Serves one request with a fresh context.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = MiddlewareContext::new();
        self.handle_with(&mut ctx, request).await
    }

    /// Serves one request with a caller-supplied context.
    pub async fn handle_with(&self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let mut response = match self.router.at(&method, &path) {
            Lookup::Matched { value, params } => {
                ctx.set_params(params);
                value.handle(ctx, request).await
            }
            Lookup::MethodNotAllowed { allowed } => {
                tracing::debug!(%method, %path, "method not routed");
                method_not_allowed(&allowed)
            }
            Lookup::NotFound => envelope::error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        };

        stamp_request_id(&mut response, ctx.request_id());
        response
    }
}

#[cfg(test)]
mod tests {
    use storefront_core::{MemoryIdentity, MemoryStore};

    use super::*;

    fn app() -> App {
        App::new(AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryIdentity::new()),
        ))
    }

    fn stages(app: &App, method: &Method, path: &str) -> Vec<&'static str> {
        match app.router().at(method, path) {
            Lookup::Matched { value, .. } => value.stage_names(),
            other => panic!("{method} {path} did not route: {other:?}"),
        }
    }

    #[test]
    fn test_recover_is_outermost_everywhere() {
        let app = app();
        for (method, path) in [
            (Method::GET, "/api/category"),
            (Method::POST, "/api/category"),
            (Method::GET, "/api/category/search"),
            (Method::GET, "/api/category/filters/search"),
            (Method::GET, "/api/category/boots"),
            (Method::PUT, "/api/category/boots"),
            (Method::DELETE, "/api/category/boots"),
            (Method::GET, "/api/category/boots/filters"),
            (Method::GET, "/api/order/me"),
            (Method::GET, "/api/order"),
            (Method::POST, "/api/order"),
            (Method::GET, "/api/order/7"),
        ] {
            assert_eq!(stages(&app, &method, path).first(), Some(&"recover_panic"), "{method} {path}");
        }
    }

    #[test]
    fn test_chain_orders() {
        let app = app();
        assert_eq!(stages(&app, &Method::GET, "/api/category"), ["recover_panic"]);
        assert_eq!(
            stages(&app, &Method::POST, "/api/category"),
            ["recover_panic", "authenticate"]
        );
        assert_eq!(
            stages(&app, &Method::GET, "/api/order/me"),
            ["recover_panic", "method_not_allowed", "authenticate"]
        );
    }

    #[test]
    fn test_order_routes_switch_on_method_inside() {
        let app = app();
        assert!(matches!(
            app.router().at(&Method::PATCH, "/api/order"),
            Lookup::Matched { .. }
        ));
        assert!(matches!(
            app.router().at(&Method::PATCH, "/api/category/boots"),
            Lookup::MethodNotAllowed { .. }
        ));
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = method_not_allowed(&[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }
}
