//! In-process collaborators.
//!
//! [`MemoryStore`] is a complete [`Controller`] over in-memory maps and
//! [`MemoryIdentity`] a token table standing in for single sign-on. The
//! binary runs on them out of the box and the integration tests use them as
//! the reference behaviour.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::collaborator::{Controller, IdentityProvider};
use crate::error::{FieldErrors, StoreError, StoreResult};
use crate::model::{Category, Filter, FilterValue, Filters, Order, OrderSort, OrderStatus, Page};
use crate::BoxFuture;

/// Categories and orders held in memory.
///
/// Order ids come from an atomic sequence starting at 1, so concurrent
/// placements never share an id.
#[derive(Debug)]
pub struct MemoryStore {
    categories: RwLock<BTreeMap<String, Category>>,
    orders: RwLock<BTreeMap<u64, Order>>,
    next_order_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn adopt_filters(category: &mut Category) {
    for filter in &mut category.filters {
        filter.category_slug.clone_from(&category.slug);
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            categories: RwLock::new(BTreeMap::new()),
            orders: RwLock::new(BTreeMap::new()),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Returns the number of orders ever placed.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    fn insert_category(&self, mut category: Category) -> StoreResult<Category> {
        adopt_filters(&mut category);
        let mut categories = self.categories.write();
        if categories.contains_key(&category.slug) {
            return Err(StoreError::already_exists("category", &category.slug));
        }
        categories.insert(category.slug.clone(), category.clone());
        tracing::debug!(slug = %category.slug, "category created");
        Ok(category)
    }

    fn replace_category(&self, slug: &str, mut category: Category) -> StoreResult<Category> {
        adopt_filters(&mut category);
        let mut categories = self.categories.write();
        if !categories.contains_key(slug) {
            return Err(StoreError::not_found("category", slug));
        }
        if category.slug != slug && categories.contains_key(&category.slug) {
            return Err(StoreError::already_exists("category", &category.slug));
        }
        categories.remove(slug);
        categories.insert(category.slug.clone(), category.clone());
        Ok(category)
    }

    fn search_categories(&self, query: &str, page: u32, size: u32) -> Page<Category> {
        let needle = query.to_lowercase();
        let hits = self
            .categories
            .read()
            .values()
            .filter(|c| contains_ignore_case(&c.name, &needle) || c.slug.contains(&needle))
            .cloned()
            .collect();
        Page::from_items(hits, page, size)
    }

    fn search_filters(&self, query: &str, page: u32, size: u32) -> Page<Filter> {
        let needle = query.to_lowercase();
        let hits = self
            .categories
            .read()
            .values()
            .flat_map(|c| c.filters.iter())
            .filter(|f| contains_ignore_case(&f.name, &needle))
            .cloned()
            .collect();
        Page::from_items(hits, page, size)
    }

    fn select_orders(&self, filters: &Filters, sort: Option<&str>) -> Vec<Order> {
        let sort = sort.and_then(OrderSort::parse).unwrap_or_default();
        let mut hits: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|order| {
                filters.iter().all(|(field, condition)| {
                    order
                        .attribute(field)
                        .is_some_and(|value| condition.matches(&value))
                })
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| sort.compare(a, b));
        hits
    }

    fn place_order(&self, user: Uuid, mut order: Order) -> Order {
        let now = Utc::now();
        order.id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        order.user_id = Some(user);
        order.status = OrderStatus::Created;
        order.total_amount = order.items_total();
        order.created_at = now;
        order.updated_at = now;

        self.orders.write().insert(order.id, order.clone());
        tracing::debug!(order_id = order.id, user_id = %user, "order placed");
        order
    }

    fn transition(&self, id: u64, next: OrderStatus, edit: Option<Order>) -> StoreResult<()> {
        let mut orders = self.orders.write();
        let current = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("order", id))?;
        if !current.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        if let Some(edit) = edit {
            current.full_name = edit.full_name;
            current.email = edit.email;
            current.phone = edit.phone;
            current.address = edit.address;
            current.comment = edit.comment;
            current.items = edit.items;
            current.total_amount = current.items_total();
        }
        current.status = next;
        current.updated_at = Utc::now();
        Ok(())
    }
}

impl Controller for MemoryStore {
    fn list_categories(&self, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Category>>> {
        Box::pin(async move {
            let all = self.categories.read().values().cloned().collect();
            Ok(Page::from_items(all, page, size))
        })
    }

    fn create_category(&self, category: Category) -> BoxFuture<'_, StoreResult<Category>> {
        Box::pin(async move { self.insert_category(category) })
    }

    fn get_category_by_slug<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Category>> {
        Box::pin(async move {
            self.categories
                .read()
                .get(slug)
                .cloned()
                .ok_or_else(|| StoreError::not_found("category", slug))
        })
    }

    fn update_category<'a>(
        &'a self,
        slug: &'a str,
        category: Category,
    ) -> BoxFuture<'a, StoreResult<Category>> {
        Box::pin(async move { self.replace_category(slug, category) })
    }

    fn delete_category<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.categories
                .write()
                .remove(slug)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("category", slug))
        })
    }

    fn category_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Category>>> {
        Box::pin(async move { Ok(self.search_categories(query, page, size)) })
    }

    fn category_filters_search<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        size: u32,
    ) -> BoxFuture<'a, StoreResult<Page<Filter>>> {
        Box::pin(async move { Ok(self.search_filters(query, page, size)) })
    }

    fn list_category_filters<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Vec<Filter>>> {
        Box::pin(async move {
            Ok(self
                .categories
                .read()
                .get(slug)
                .map(|c| c.filters.clone())
                .unwrap_or_default())
        })
    }

    fn list_orders<'a>(
        &'a self,
        page: u32,
        size: u32,
        filters: &'a Filters,
        sort: Option<&'a str>,
    ) -> BoxFuture<'a, StoreResult<Page<Order>>> {
        Box::pin(async move { Ok(Page::from_items(self.select_orders(filters, sort), page, size)) })
    }

    fn list_user_orders(&self, user: Uuid, page: u32, size: u32) -> BoxFuture<'_, StoreResult<Page<Order>>> {
        Box::pin(async move {
            let mut owned = Filters::new();
            owned.insert("user_id", FilterValue::Exact(user.to_string()));
            Ok(Page::from_items(self.select_orders(&owned, None), page, size))
        })
    }

    fn get_order(&self, id: u64) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move {
            self.orders
                .read()
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("order", id))
        })
    }

    fn create_order(&self, user: Uuid, order: Order) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move { Ok(self.place_order(user, order)) })
    }

    fn update_order(&self, id: u64, order: Order) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let next = if order.status.is_fulfillment() {
                order.status
            } else {
                OrderStatus::Updated
            };
            self.transition(id, next, Some(order))
        })
    }

    fn cancel_order(&self, id: u64) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move { self.transition(id, OrderStatus::Cancelled, None) })
    }
}

/// Token table and user registry standing in for single sign-on.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    tokens: RwLock<HashMap<String, String>>,
    users: RwLock<HashMap<String, Uuid>>,
}

impl MemoryIdentity {
    /// Creates an identity provider with no tokens or users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `token` verify to `subject`.
    pub fn register_token(&self, token: impl Into<String>, subject: impl Into<String>) {
        self.tokens.write().insert(token.into(), subject.into());
    }

    /// Returns the id registered for `email`, if any.
    #[must_use]
    pub fn user_id(&self, email: &str) -> Option<Uuid> {
        self.users.read().get(&email.to_lowercase()).copied()
    }

    /// Returns the number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl IdentityProvider for MemoryIdentity {
    fn parse_claims<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StoreResult<String>> {
        Box::pin(async move {
            self.tokens
                .read()
                .get(token)
                .cloned()
                .ok_or_else(|| StoreError::unauthorized("invalid token"))
        })
    }

    fn create_user<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        _password: &'a str,
    ) -> BoxFuture<'a, StoreResult<String>> {
        Box::pin(async move {
            let email = email.trim().to_lowercase();
            if email.is_empty() {
                let mut errors = FieldErrors::new();
                errors.add("email", "required to register a user");
                return Err(StoreError::validation(errors));
            }
            let id = *self
                .users
                .write()
                .entry(email)
                .or_insert_with(Uuid::now_v7);
            tracing::debug!(user_id = %id, name, "user registered");
            Ok(id.to_string())
        })
    }
}
