//! Bearer token authentication.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::StatusCode;
use storefront_core::{AuthenticatedUser, IdentityProvider, StoreError};

use crate::context::MiddlewareContext;
use crate::envelope;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Prefix of an `Authorization` header carrying a bearer token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Returns the token of a `Bearer` authorization header, if any.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Verifies the bearer token with the identity provider and attaches the
/// resulting user to the context.
///
/// Requests without a verifiable token are answered with 401 and never
/// reach the endpoint.
#[derive(Clone)]
pub struct Authenticate {
    identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for Authenticate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticate").finish_non_exhaustive()
    }
}

impl Authenticate {
    /// Creates the stage over an identity provider.
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    fn reject(ctx: &MiddlewareContext, err: &StoreError) -> Response {
        tracing::debug!(request_id = %ctx.request_id(), error = %err, "authentication failed");
        let message = match err {
            StoreError::Unauthorized { .. } => err.public_message(),
            _ => StoreError::unauthorized("invalid token").public_message(),
        };
        envelope::error(StatusCode::UNAUTHORIZED, &message)
    }
}

impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(token) = bearer_token(&request) else {
                return Self::reject(ctx, &StoreError::unauthorized("missing bearer token"));
            };

            let claims = self.identity.parse_claims(token).await;
            match claims {
                Ok(subject) => {
                    ctx.set_user(AuthenticatedUser::new(subject));
                    next.run(ctx, request).await
                }
                Err(err) => Self::reject(ctx, &err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Chain, Endpoint};
    use http_body_util::BodyExt;
    use storefront_core::{MemoryIdentity, StoreResult};

    struct WhoAmI;

    impl Endpoint for WhoAmI {
        fn call<'a>(&'a self, ctx: &'a mut MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                match ctx.user() {
                    Ok(user) => envelope::success(StatusCode::OK, user.subject()),
                    Err(_) => envelope::error(StatusCode::IM_A_TEAPOT, "no user"),
                }
            })
        }
    }

    struct Down;

    impl IdentityProvider for Down {
        fn parse_claims<'a>(&'a self, _token: &'a str) -> BoxFuture<'a, StoreResult<String>> {
            Box::pin(async { Err(StoreError::internal("sso unreachable")) })
        }

        fn create_user<'a>(&'a self, _: &'a str, _: &'a str, _: &'a str) -> BoxFuture<'a, StoreResult<String>> {
            Box::pin(async { Err(StoreError::internal("sso unreachable")) })
        }
    }

    fn chain(identity: Arc<dyn IdentityProvider>) -> Chain {
        Chain::builder()
            .layer(Authenticate::new(identity))
            .endpoint(WhoAmI)
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/api/order");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Default::default()).unwrap()
    }

    async fn error_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_valid_token_attaches_user() {
        let identity = Arc::new(MemoryIdentity::new());
        identity.register_token("good", "user-7");

        let response = chain(identity).handle(&mut MiddlewareContext::new(), request(Some("Bearer good"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_non_bearer_header() {
        let chain = chain(Arc::new(MemoryIdentity::new()));
        for auth in [None, Some("Basic dXNlcjpwdw=="), Some("bearer lowercase")] {
            let response = chain.handle(&mut MiddlewareContext::new(), request(auth)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(error_text(response).await, "unauthorized: missing bearer token");
        }
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let response = chain(Arc::new(MemoryIdentity::new()))
            .handle(&mut MiddlewareContext::new(), request(Some("Bearer nope")))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_text(response).await, "unauthorized: invalid token");
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_leak_detail() {
        let response = chain(Arc::new(Down))
            .handle(&mut MiddlewareContext::new(), request(Some("Bearer x")))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_text(response).await, "unauthorized: invalid token");
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&request(Some("Token abc"))), None);
        assert_eq!(bearer_token(&request(None)), None);
    }
}
