//! Captured path variables.

use smallvec::SmallVec;

/// Routes in this service capture at most two variables.
const INLINE_PARAMS: usize = 2;

/// Path variables captured while matching a route, in path order.
///
/// ```rust
/// use storefront_router::Params;
///
/// let mut params = Params::new();
/// params.push("slug", "boots");
/// assert_eq!(params.get("slug"), Some("boots"));
/// assert_eq!(params.get("id"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured variable.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops every variable captured after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_first_value_wins_on_duplicate_name() {
        let mut params = Params::new();
        params.push("slug", "a");
        params.push("slug", "b");
        assert_eq!(params.get("slug"), Some("a"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_truncate_drops_tail() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.push("c", "3");
        params.truncate(1);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1")]);
    }
}
