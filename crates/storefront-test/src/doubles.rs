//! Recording collaborators.
//!
//! [`RecordingController`] and [`StubIdentity`] delegate to the in-memory
//! implementations while counting what the handlers asked for, so tests can
//! assert that a request never reached the controller or that a guest was
//! provisioned exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use storefront_core::{
    BoxFuture, Category, Controller, ErrorKind, FieldErrors, Filter, Filters, IdentityProvider,
    MemoryIdentity, MemoryStore, Order, Page, StoreError, StoreResult,
};
use uuid::Uuid;

/// One controller invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Controller method name, e.g. `"list_categories"`.
    pub op: &'static str,
    /// Page argument, for paginated methods.
    pub page: Option<u32>,
    /// Size argument, for paginated methods.
    pub size: Option<u32>,
    /// Sort token, for `list_orders`.
    pub sort: Option<String>,
}

/// What an armed controller method does instead of delegating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Return an error of this kind.
    Kind(ErrorKind),
    /// Panic inside the handler future.
    Panic,
}

fn error_of(kind: ErrorKind, op: &'static str) -> StoreError {
    match kind {
        ErrorKind::Decode => StoreError::decode(format!("{op} rejected input")),
        ErrorKind::Validation => {
            let mut errors = FieldErrors::new();
            errors.add("payload", "rejected");
            StoreError::validation(errors)
        }
        ErrorKind::Unauthorized => StoreError::unauthorized("rejected"),
        ErrorKind::NotFound => StoreError::not_found("record", op),
        ErrorKind::MethodNotAllowed => StoreError::MethodNotAllowed,
        ErrorKind::AlreadyExists => StoreError::already_exists("record", op),
        ErrorKind::Internal => StoreError::internal(format!("{op} failed: connection reset")),
    }
}

/// A [`Controller`] over [`MemoryStore`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingController {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    failures: RwLock<HashMap<&'static str, Failure>>,
}

impl RecordingController {
    /// Creates a controller over an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.inner
    }

    /// Makes every later call to `op` fail as described.
    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.failures.write().insert(op, failure);
    }

    /// Returns the recorded calls to `op`, oldest first.
    #[must_use]
    pub fn calls(&self, op: &str) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    /// Returns the number of calls across all methods.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn enter(&self, op: &'static str, paging: Option<(u32, u32)>) -> StoreResult<()> {
        self.enter_sorted(op, paging, None)
    }

    fn enter_sorted(
        &self,
        op: &'static str,
        paging: Option<(u32, u32)>,
        sort: Option<&str>,
    ) -> StoreResult<()> {
        self.calls.lock().push(Call {
            op,
            page: paging.map(|(page, _)| page),
            size: paging.map(|(_, size)| size),
            sort: sort.map(str::to_string),
        });
        let failure = self.failures.read().get(op).copied();
        match failure {
            None => Ok(()),
            Some(Failure::Kind(kind)) => Err(error_of(kind, op)),
            Some(Failure::Panic) => panic!("{op} panicked"),
        }
    }
}

impl Controller for RecordingController {
    fn list_categories(&self, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Category>>> {
        Box::pin(async move {
            self.enter("list_categories", Some((page, size)))?;
            self.inner.list_categories(page, size).await
        })
    }

    fn create_category(&self, category: Category) -> BoxFuture<'_, StoreResult<Category>> {
        Box::pin(async move {
            self.enter("create_category", None)?;
            self.inner.create_category(category).await
        })
    }

    fn get_category_by_slug<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Category>> {
        Box::pin(async move {
            self.enter("get_category_by_slug", None)?;
            self.inner.get_category_by_slug(slug).await
        })
    }

    fn update_category<'a>(
        &'a self,
        slug: &'a str,
        category: Category,
    ) -> BoxFuture<'a, StoreResult<Category>> {
        Box::pin(async move {
            self.enter("update_category", None)?;
            self.inner.update_category(slug, category).await
        })
    }

    fn delete_category<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.enter("delete_category", None)?;
            self.inner.delete_category(slug).await
        })
    }

    fn category_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Category>>> {
        Box::pin(async move {
            self.enter("category_search", Some((page, size)))?;
            self.inner.category_search(query, page, size).await
        })
    }

    fn category_filters_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Filter>>> {
        Box::pin(async move {
            self.enter("category_filters_search", Some((page, size)))?;
            self.inner.category_filters_search(query, page, size).await
        })
    }

    fn list_category_filters<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Vec<Filter>>> {
        Box::pin(async move {
            self.enter("list_category_filters", None)?;
            self.inner.list_category_filters(slug).await
        })
    }

    fn list_orders<'a>(
        &'a self,
        page: u32,
        size: u32,
        filters: &'a Filters,
        sort: Option<&'a str>,
    ) -> BoxFuture<'a, StoreResult<Page<Order>>> {
        Box::pin(async move {
            self.enter_sorted("list_orders", Some((page, size)), sort)?;
            self.inner.list_orders(page, size, filters, sort).await
        })
    }

    fn list_user_orders(&self, user: Uuid, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Order>>> {
        Box::pin(async move {
            self.enter("list_user_orders", Some((page, size)))?;
            self.inner.list_user_orders(user, page, size).await
        })
    }

    fn get_order(&self, id: u64) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move {
            self.enter("get_order", None)?;
            self.inner.get_order(id).await
        })
    }

    fn create_order(&self, user: Uuid, order: Order) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move {
            self.enter("create_order", None)?;
            self.inner.create_order(user, order).await
        })
    }

    fn update_order(&self, id: u64, order: Order) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.enter("update_order", None)?;
            self.inner.update_order(id, order).await
        })
    }

    fn cancel_order(&self, id: u64) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.enter("cancel_order", None)?;
            self.inner.cancel_order(id).await
        })
    }
}

/// How [`StubIdentity::create_user`] answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateUserMode {
    /// Register the user and return a real id.
    #[default]
    Issue,
    /// Fail with an internal error.
    Fail,
    /// Succeed with an id that is not a UUID.
    Malformed,
}

/// An [`IdentityProvider`] over [`MemoryIdentity`] that counts calls.
#[derive(Debug, Default)]
pub struct StubIdentity {
    inner: MemoryIdentity,
    mode: RwLock<CreateUserMode>,
    parse_claims_calls: AtomicUsize,
    create_user_calls: AtomicUsize,
}

impl StubIdentity {
    /// Creates a provider with no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `token` verify to `subject`.
    pub fn register_token(&self, token: &str, subject: &str) {
        self.inner.register_token(token, subject);
    }

    /// Changes how later `create_user` calls answer.
    pub fn set_create_user_mode(&self, mode: CreateUserMode) {
        *self.mode.write() = mode;
    }

    /// Returns the id registered for `email`.
    #[must_use]
    pub fn user_id(&self, email: &str) -> Option<Uuid> {
        self.inner.user_id(email)
    }

    /// Returns how often `parse_claims` ran.
    #[must_use]
    pub fn parse_claims_calls(&self) -> usize {
        self.parse_claims_calls.load(Ordering::SeqCst)
    }

    /// Returns how often `create_user` ran.
    #[must_use]
    pub fn create_user_calls(&self) -> usize {
        self.create_user_calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for StubIdentity {
    fn parse_claims<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StoreResult<String>> {
        self.parse_claims_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_claims(token)
    }

    fn create_user<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, StoreResult<String>> {
        self.create_user_calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.read();
        match mode {
            CreateUserMode::Issue => self.inner.create_user(name, email, password),
            CreateUserMode::Fail => {
                Box::pin(async { Err::<String, _>(StoreError::internal("identity provider unavailable")) })
            }
            CreateUserMode::Malformed => Box::pin(async { Ok::<_, StoreError>("not-a-uuid".to_string()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_paging_arguments() {
        let controller = RecordingController::new();
        controller.list_categories(3, 7).await.unwrap();
        controller.get_order(1).await.unwrap_err();

        assert_eq!(
            controller.calls("list_categories"),
            vec![Call {
                op: "list_categories",
                page: Some(3),
                size: Some(7),
                sort: None,
            }]
        );
        assert_eq!(controller.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_armed_failure() {
        let controller = RecordingController::new();
        controller.fail("get_category_by_slug", Failure::Kind(ErrorKind::AlreadyExists));
        let err = controller.get_category_by_slug("x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_identity_modes() {
        let identity = StubIdentity::new();
        let issued = identity.create_user("Ann", "ann@example.com", "pw").await.unwrap();
        assert!(Uuid::parse_str(&issued).is_ok());

        identity.set_create_user_mode(CreateUserMode::Malformed);
        assert_eq!(identity.create_user("Ann", "a@b.c", "pw").await.unwrap(), "not-a-uuid");

        identity.set_create_user_mode(CreateUserMode::Fail);
        assert!(identity.create_user("Ann", "a@b.c", "pw").await.is_err());
        assert_eq!(identity.create_user_calls(), 3);
    }
}
