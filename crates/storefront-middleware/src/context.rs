//! Per-request state shared by the chain and the endpoint.

use std::time::{Duration, Instant};

use storefront_core::{AuthenticatedUser, IdentityError, RequestId};
use storefront_router::Params;

/// State that travels with one request through its chain.
///
/// Authentication stages attach the verified user here; the router attaches
/// captured path variables before the chain runs.
///
/// ```
/// use storefront_core::AuthenticatedUser;
/// use storefront_middleware::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// assert!(ctx.user().is_err());
///
/// ctx.set_user(AuthenticatedUser::new("0190a8a4-62b4-7c3e-9d1e-3f0f6a1b2c3d"));
/// assert!(ctx.user().unwrap().user_id().is_ok());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    user: Option<AuthenticatedUser>,
    params: Params,
    started_at: Instant,
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareContext {
    /// Creates a context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context for an existing request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            user: None,
            params: Params::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the user attached by an authentication stage.
    pub fn user(&self) -> Result<&AuthenticatedUser, IdentityError> {
        self.user.as_ref().ok_or(IdentityError::Missing)
    }

    /// Attaches the verified user.
    pub fn set_user(&mut self, user: AuthenticatedUser) {
        self.user = Some(user);
    }

    /// Returns a captured path variable.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Replaces the captured path variables.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Returns the time since the request entered the chain.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_is_distinct_error() {
        let ctx = MiddlewareContext::new();
        assert!(matches!(ctx.user(), Err(IdentityError::Missing)));
    }

    #[test]
    fn test_params() {
        let mut ctx = MiddlewareContext::new();
        let mut params = Params::new();
        params.push("slug", "hats");
        ctx.set_params(params);
        assert_eq!(ctx.param("slug"), Some("hats"));
        assert_eq!(ctx.param("id"), None);
    }

    #[test]
    fn test_request_id_preserved() {
        let id = RequestId::new();
        assert_eq!(MiddlewareContext::with_request_id(id).request_id(), id);
    }
}
