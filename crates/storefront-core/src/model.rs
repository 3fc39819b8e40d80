//! Catalog and order data model.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog category addressed by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// URL-safe unique key.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Filters owned by this category, in display order.
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// A named facet of a category with its permissible values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Facet name, unique within its category.
    pub name: String,
    /// Values a product may take for this facet.
    #[serde(default)]
    pub values: Vec<String>,
    /// Owning category. Filled in by the store when left empty.
    #[serde(default)]
    pub category_slug: String,
}

/// Lifecycle state of an order.
///
/// `Cancelled` is terminal. Every other state may move to `Updated`, a
/// fulfillment state, or `Cancelled`; nothing returns to `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Just placed.
    #[default]
    Created,
    /// Edited after placement.
    Updated,
    /// Being assembled.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Withdrawn.
    Cancelled,
}

impl OrderStatus {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true for states past placement that describe delivery progress.
    #[must_use]
    pub const fn is_fulfillment(self) -> bool {
        matches!(self, Self::Processing | Self::Shipped | Self::Delivered)
    }

    /// Returns true if an order in `self` may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        !self.is_terminal() && !matches!(next, Self::Created)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product being ordered.
    pub product_slug: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price.
    pub price: f64,
}

/// A customer order.
///
/// Clients send contact fields and items; the controller owns `id`,
/// `user_id`, `status`, `total_amount` and the timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// Numeric id assigned at creation.
    pub id: u64,
    /// Owner, unset until the order is created.
    pub user_id: Option<Uuid>,
    /// Contact name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Delivery address.
    pub address: String,
    /// Customer note.
    pub comment: String,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Ordered lines.
    pub items: Vec<OrderItem>,
    /// Sum of `quantity * price` over `items`.
    pub total_amount: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Computes the order total from its lines.
    #[must_use]
    pub fn items_total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| f64::from(item.quantity) * item.price)
            .sum()
    }

    /// Returns the textual value of a filterable attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        Some(match name {
            "id" => self.id.to_string(),
            "user_id" => self.user_id?.to_string(),
            "full_name" => self.full_name.clone(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "status" => self.status.as_str().to_string(),
            "total_amount" => self.total_amount.to_string(),
            "created_at" => self.created_at.to_rfc3339(),
            "updated_at" => self.updated_at.to_rfc3339(),
            _ => return None,
        })
    }
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
    /// Items on this page.
    pub data: Vec<T>,
    /// Items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Cuts page `page` of `size` items out of the full result set.
    #[must_use]
    pub fn from_items(items: Vec<T>, page: u32, size: u32) -> Self {
        let total = items.len() as u64;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(size as usize);
        let data = items.into_iter().skip(skip).take(size as usize).collect();
        Self {
            page,
            size,
            data,
            total,
        }
    }
}

/// A filter condition on one attribute, parsed from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// `field=value`
    Exact(String),
    /// `field=a,b,c`
    AnyOf(Vec<String>),
    /// `field[min]=x` and/or `field[max]=y`, both inclusive.
    Range {
        /// Lower bound.
        min: Option<String>,
        /// Upper bound.
        max: Option<String>,
    },
}

impl FilterValue {
    /// Tests an attribute value against this condition.
    ///
    /// Range bounds compare numerically when both sides are numbers and
    /// lexicographically otherwise, which orders RFC 3339 timestamps.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::AnyOf(options) => options.iter().any(|o| o == value),
            Self::Range { min, max } => {
                min.as_deref()
                    .map_or(true, |min| compare_loose(value, min) != Ordering::Less)
                    && max
                        .as_deref()
                        .map_or(true, |max| compare_loose(value, max) != Ordering::Greater)
            }
        }
    }
}

fn compare_loose(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Attribute conditions for order listing, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, FilterValue>);

impl Filters {
    /// Query keys that control paging and never become filters.
    pub const RESERVED: [&'static str; 3] = ["page", "size", "sort"];

    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds filters from decoded query pairs.
    ///
    /// Reserved keys and empty values are skipped. A later plain key
    /// replaces an earlier one; `[min]`/`[max]` keys on the same field
    /// combine into one range.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if value.is_empty() || Self::RESERVED.iter().any(|r| *r == key) {
                continue;
            }
            if let Some(field) = key.strip_suffix("[min]") {
                filters.set_bound(field, Some(value), None);
            } else if let Some(field) = key.strip_suffix("[max]") {
                filters.set_bound(field, None, Some(value));
            } else if value.contains(',') {
                let options = value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();
                filters.0.insert(key.to_string(), FilterValue::AnyOf(options));
            } else {
                filters.0.insert(key.to_string(), FilterValue::Exact(value.to_string()));
            }
        }
        filters
    }

    fn set_bound(&mut self, field: &str, lower: Option<&str>, upper: Option<&str>) {
        let entry = self
            .0
            .entry(field.to_string())
            .or_insert(FilterValue::Range { min: None, max: None });
        if !matches!(entry, FilterValue::Range { .. }) {
            *entry = FilterValue::Range { min: None, max: None };
        }
        if let FilterValue::Range { min, max } = entry {
            if let Some(lower) = lower {
                *min = Some(lower.to_string());
            }
            if let Some(upper) = upper {
                *max = Some(upper.to_string());
            }
        }
    }

    /// Adds or replaces a condition.
    pub fn insert(&mut self, field: impl Into<String>, value: FilterValue) {
        self.0.insert(field.into(), value);
    }

    /// Returns the condition on `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.0.get(field)
    }

    /// Returns true if there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates conditions in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Order attributes that listings can sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Numeric id, i.e. placement order.
    Id,
    /// Creation time.
    CreatedAt,
    /// Order total.
    TotalAmount,
    /// Lifecycle state name.
    Status,
}

/// A parsed sort token: `field` ascending, `-field` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSort {
    /// Attribute to sort on.
    pub field: SortField,
    /// Reverse order.
    pub descending: bool,
}

impl Default for OrderSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::Id,
            descending: true,
        }
    }
}

impl OrderSort {
    /// Parses a sort token, returning `None` for an unknown field.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (name, descending) = match token.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        let field = match name {
            "id" => SortField::Id,
            "created_at" => SortField::CreatedAt,
            "total_amount" => SortField::TotalAmount,
            "status" => SortField::Status,
            _ => return None,
        };
        Some(Self { field, descending })
    }

    /// Orders two orders according to this sort.
    #[must_use]
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let ordering = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
        .then_with(|| a.id.cmp(&b.id));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
