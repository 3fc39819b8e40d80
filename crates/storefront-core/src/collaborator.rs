//! Contracts the HTTP layer calls but does not implement.
//!
//! All traits are object safe so the server can hold them as
//! `Arc<dyn Trait>` and tests can swap in recording doubles.

use std::time::{Duration, Instant};

use http::StatusCode;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{Category, Filter, Filters, Order, Page};
use crate::BoxFuture;

/// Business rules and persistence coordination for categories and orders.
///
/// Implementations report absent entities with
/// [`StoreError::NotFound`](crate::StoreError::NotFound) and uniqueness
/// conflicts with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists);
/// handlers map those to 404 and 409.
pub trait Controller: Send + Sync + 'static {
    /// Lists categories.
    fn list_categories(&self, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Category>>>;

    /// Creates a category and returns it as stored.
    fn create_category(&self, category: Category) -> BoxFuture<'_, StoreResult<Category>>;

    /// Fetches one category.
    fn get_category_by_slug<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Category>>;

    /// Replaces a category and returns it as stored.
    fn update_category<'a>(
        &'a self,
        slug: &'a str,
        category: Category,
    ) -> BoxFuture<'a, StoreResult<Category>>;

    /// Deletes a category together with its filters.
    fn delete_category<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<()>>;

    /// Searches categories by name or slug.
    fn category_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Category>>>;

    /// Searches filters across all categories by name.
    fn category_filters_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Filter>>>;

    /// Lists the filters of one category.
    fn list_category_filters<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Vec<Filter>>>;

    /// Lists all orders matching `filters`, sorted by the `sort` token.
    fn list_orders<'a>(
        &'a self,
        page: u32,
        size: u32,
        filters: &'a Filters,
        sort: Option<&'a str>,
    ) -> BoxFuture<'a, StoreResult<Page<Order>>>;

    /// Lists the orders owned by `user`.
    fn list_user_orders(&self, user: Uuid, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Order>>>;

    /// Fetches one order.
    fn get_order(&self, id: u64) -> BoxFuture<'_, StoreResult<Order>>;

    /// Places an order owned by `user`.
    fn create_order(&self, user: Uuid, order: Order) -> BoxFuture<'_, StoreResult<Order>>;

    /// Edits an order that is not cancelled.
    fn update_order(&self, id: u64, order: Order) -> BoxFuture<'_, StoreResult<()>>;

    /// Cancels an order that is not already cancelled.
    fn cancel_order(&self, id: u64) -> BoxFuture<'_, StoreResult<()>>;
}

/// Single sign-on service issuing and verifying user identities.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verifies `token` and returns its subject claim.
    fn parse_claims<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StoreResult<String>>;

    /// Registers a user and returns its id as issued by the provider.
    ///
    /// Repeated calls for the same email are the provider's to deduplicate.
    fn create_user<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, StoreResult<String>>;
}

/// Domain validation of decoded payloads.
pub trait Validator: Send + Sync + 'static {
    /// Checks a category payload.
    fn validate_category(&self, category: &Category) -> StoreResult<()>;

    /// Checks an order payload.
    fn validate_order(&self, order: &Order) -> StoreResult<()>;
}

/// Receives one observation per handled request.
pub trait MetricsSink: Send + Sync + 'static {
    /// Records the outcome of operation `op`.
    fn observe_request(&self, duration: Duration, status: StatusCode, op: &'static str);
}

/// Sink that drops every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn observe_request(&self, _duration: Duration, _status: StatusCode, _op: &'static str) {}
}

/// Records a request observation when dropped.
///
/// Handlers create one on entry and update its status as they go, so every
/// exit path, early returns included, reports the final status exactly once.
///
/// ```
/// use http::StatusCode;
/// use storefront_core::{NoopMetrics, Observation};
///
/// let sink = NoopMetrics;
/// let mut obs = Observation::start(&sink, "category.getCategory.handler", StatusCode::OK);
/// obs.set_status(StatusCode::NOT_FOUND);
/// assert_eq!(obs.status(), StatusCode::NOT_FOUND);
/// ```
pub struct Observation<'a> {
    sink: &'a dyn MetricsSink,
    op: &'static str,
    started: Instant,
    status: StatusCode,
}

impl<'a> Observation<'a> {
    /// Starts timing `op` with an initial status.
    pub fn start(sink: &'a dyn MetricsSink, op: &'static str, status: StatusCode) -> Self {
        Self {
            sink,
            op,
            started: Instant::now(),
            status,
        }
    }

    /// Replaces the status that will be reported.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the status that will be reported.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the operation name.
    #[must_use]
    pub fn op(&self) -> &'static str {
        self.op
    }
}

impl Drop for Observation<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_request(self.started.elapsed(), self.status, self.op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(StatusCode, &'static str)>>);

    impl MetricsSink for Recorder {
        fn observe_request(&self, _duration: Duration, status: StatusCode, op: &'static str) {
            self.0.lock().push((status, op));
        }
    }

    fn early_return(sink: &dyn MetricsSink, fail: bool) -> Result<(), ()> {
        let mut obs = Observation::start(sink, "orders.getOrder.handler", StatusCode::OK);
        if fail {
            obs.set_status(StatusCode::BAD_REQUEST);
            return Err(());
        }
        Ok(())
    }

    #[test]
    fn test_observation_records_on_every_exit() {
        let recorder = Recorder::default();
        early_return(&recorder, false).unwrap();
        early_return(&recorder, true).unwrap_err();

        assert_eq!(
            *recorder.0.lock(),
            vec![
                (StatusCode::OK, "orders.getOrder.handler"),
                (StatusCode::BAD_REQUEST, "orders.getOrder.handler"),
            ]
        );
    }

    #[test]
    fn test_observation_records_during_unwind() {
        let recorder = Recorder::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _obs = Observation::start(&recorder, "op", StatusCode::OK);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(recorder.0.lock().len(), 1);
    }
}
