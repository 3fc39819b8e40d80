//! Router facade over the segment tree.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;

/// Result of routing a request.
#[derive(Debug)]
pub enum Lookup<'a, T> {
    /// The path and method resolved to a value.
    Matched {
        /// Routed value.
        value: &'a T,
        /// Captured path variables.
        params: Params,
    },
    /// The path is known but does not accept the method.
    MethodNotAllowed {
        /// Methods the path does accept.
        allowed: Vec<Method>,
    },
    /// No registered path matches.
    NotFound,
}

/// Maps `(method, path)` pairs to routed values.
///
/// Registration happens once at startup; lookups borrow the router and
/// allocate only for captured variables.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a method table for `path`.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) {
        self.root.insert(path, methods);
        self.route_count += 1;
    }

    /// Registers a single method for `path`.
    pub fn route(&mut self, method: Method, path: &str, value: T) {
        self.insert(path, MethodRouter::new().on(method, value));
    }

    /// Resolves a request.
    #[must_use]
    pub fn at(&self, method: &Method, path: &str) -> Lookup<'_, T> {
        let mut allowed = Vec::new();
        match self.root.match_path(method, path, &mut allowed) {
            Some((value, params)) => Lookup::Matched { value, params },
            None if allowed.is_empty() => Lookup::NotFound,
            None => Lookup::MethodNotAllowed { allowed },
        }
    }

    /// Returns the number of `insert`/`route` calls made.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
