//! Default domain rules.

use std::collections::HashSet;

use crate::collaborator::Validator;
use crate::error::{FieldErrors, StoreResult};
use crate::model::{Category, Order};

const MAX_SLUG_LEN: usize = 128;

/// Built-in [`Validator`] enforcing the catalog and order rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
    /// Creates the validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SLUG_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

impl Validator for RuleValidator {
    fn validate_category(&self, category: &Category) -> StoreResult<()> {
        let mut errors = FieldErrors::new();
        if !is_slug(&category.slug) {
            errors.add("slug", "must be 1-128 characters of a-z, 0-9 or '-'");
        }
        if category.name.trim().is_empty() {
            errors.add("name", "must not be empty");
        }

        let mut seen = HashSet::new();
        for (i, filter) in category.filters.iter().enumerate() {
            if filter.name.trim().is_empty() {
                errors.add(format!("filters[{i}].name"), "must not be empty");
            } else if !seen.insert(filter.name.as_str()) {
                errors.add(format!("filters[{i}].name"), "duplicates another filter");
            }
        }
        errors.into_result()
    }

    fn validate_order(&self, order: &Order) -> StoreResult<()> {
        let mut errors = FieldErrors::new();
        if order.full_name.trim().is_empty() {
            errors.add("full_name", "must not be empty");
        }
        if !is_email(order.email.trim()) {
            errors.add("email", "must be a valid email address");
        }
        if order.items.is_empty() {
            errors.add("items", "must contain at least one item");
        }
        for (i, item) in order.items.iter().enumerate() {
            if item.product_slug.trim().is_empty() {
                errors.add(format!("items[{i}].product_slug"), "must not be empty");
            }
            if item.quantity == 0 {
                errors.add(format!("items[{i}].quantity"), "must be positive");
            }
            if !item.price.is_finite() || item.price < 0.0 {
                errors.add(format!("items[{i}].price"), "must be a non-negative number");
            }
        }
        errors.into_result()
    }
}
