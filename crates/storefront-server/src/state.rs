//! Shared handler state.

use std::sync::Arc;

use storefront_config::PaginationConfig;
use storefront_core::{Controller, IdentityProvider, MetricsSink, NoopMetrics, RuleValidator, Validator};

/// Collaborators and settings every handler reads.
///
/// Built once at startup and shared by reference with all routes.
#[derive(Clone)]
pub struct AppState {
    /// Business rules and storage.
    pub controller: Arc<dyn Controller>,
    /// Token verification and guest provisioning.
    pub identity: Arc<dyn IdentityProvider>,
    /// Payload rules checked before any controller call.
    pub validator: Arc<dyn Validator>,
    /// Per-request observations.
    pub metrics: Arc<dyn MetricsSink>,
    /// Page and search defaults.
    pub pagination: PaginationConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates state with the default rule set, no metrics and default
    /// pagination.
    pub fn new(controller: Arc<dyn Controller>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            controller,
            identity,
            validator: Arc::new(RuleValidator::new()),
            metrics: Arc::new(NoopMetrics),
            pagination: PaginationConfig::default(),
        }
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replaces the pagination defaults.
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }
}
