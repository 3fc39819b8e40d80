//! Per-path method table.

use http::Method;

/// Maps HTTP methods to routed values for a single path.
///
/// A value registered with [`MethodRouter::any`] answers every method that
/// has no explicit entry, which lets the routed value perform its own
/// method switch.
///
/// ```rust
/// use storefront_router::MethodRouter;
/// use http::Method;
///
/// let methods = MethodRouter::new().get("list").post("create");
/// assert_eq!(methods.value_for(&Method::GET), Some(&"list"));
/// assert_eq!(methods.value_for(&Method::DELETE), None);
/// assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: Vec<(Method, T)>,
    any: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            any: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET value.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.on(Method::GET, value)
    }

    /// Registers a POST value.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.on(Method::POST, value)
    }

    /// Registers a PUT value.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.on(Method::PUT, value)
    }

    /// Registers a DELETE value.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.on(Method::DELETE, value)
    }

    /// Registers a value for `method`, replacing any previous one.
    #[must_use]
    pub fn on(mut self, method: Method, value: T) -> Self {
        self.insert(method, value);
        self
    }

    /// Registers a value answering every method without its own entry.
    #[must_use]
    pub fn any(mut self, value: T) -> Self {
        self.any = Some(value);
        self
    }

    fn insert(&mut self, method: Method, value: T) {
        if let Some(slot) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            slot.1 = value;
        } else {
            self.entries.push((method, value));
        }
    }

    /// Returns the value registered for `method`, falling back to the
    /// catch-all value.
    #[must_use]
    pub fn value_for(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
            .or(self.any.as_ref())
    }

    /// Returns the explicitly registered methods in registration order.
    ///
    /// A catch-all value is not listed since it accepts any method.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.any.is_none()
    }

    /// Moves every entry of `other` into `self`. Entries from `other` win.
    pub fn merge(&mut self, other: MethodRouter<T>) {
        for (method, value) in other.entries {
            self.insert(method, value);
        }
        if other.any.is_some() {
            self.any = other.any;
        }
    }
}
