//! Query string access.
//!
//! Lookups return the first value of a key. Pagination values never fail a
//! request: anything absent, unparsable or below 1 takes the default.

use storefront_core::Filters;

use storefront_middleware::Request;

/// Decoded query pairs of one request.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Decodes the request's query string. A malformed string decodes as
    /// empty.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self::parse(request.uri().query().unwrap_or_default())
    }

    /// Decodes a raw query string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            pairs: serde_urlencoded::from_str(raw).unwrap_or_default(),
        }
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `key` as a page number or size, or `default`.
    #[must_use]
    pub fn positive_or(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(default)
    }

    /// Returns the `sort` token if present and non-empty.
    #[must_use]
    pub fn sort(&self) -> Option<&str> {
        self.get("sort").filter(|s| !s.is_empty())
    }

    /// Returns every non-reserved pair as an attribute filter.
    #[must_use]
    pub fn filters(&self) -> Filters {
        Filters::from_query_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
