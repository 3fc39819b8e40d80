//! Segment tree nodes.

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;

/// How a node matches a request path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `category`.
    Static,
    /// Named variable such as `{slug}`, matching exactly one segment.
    Param(String),
    /// Catch-all such as `*rest`, matching one or more trailing segments.
    Wildcard(String),
}

/// A node of the route tree.
///
/// A node carries a [`MethodRouter`] only when a registered path ends at
/// it.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Segment text as written in the pattern.
    pub segment: String,
    /// Matching behaviour of this node.
    pub kind: SegmentKind,
    /// Method table for a path ending here.
    pub methods: Option<MethodRouter<T>>,
    /// Literal children, kept sorted for binary search.
    pub static_children: Vec<Node<T>>,
    /// At most one variable child.
    pub param_child: Option<Box<Node<T>>>,
    /// At most one catch-all child, always a leaf.
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root of an empty tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind(String::new(), SegmentKind::Static)
    }

    /// Registers `methods` under the pattern `path`.
    ///
    /// Registering the same pattern twice merges the method tables.
    ///
    /// # Panics
    ///
    /// Panics if a `*wildcard` segment is not the last one in `path`.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) {
        let segments = parse_pattern(path);
        self.insert_segments(&segments, methods);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter<T>) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => self.static_children[i].insert_segments(remaining, methods),
                    Err(i) => {
                        let mut child = Self::with_kind(segment.clone(), kind.clone());
                        child.insert_segments(remaining, methods);
                        self.static_children.insert(i, child);
                    }
                }
            }
            SegmentKind::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Self::with_kind(segment.clone(), kind.clone())))
                .insert_segments(remaining, methods),
            SegmentKind::Wildcard(_) => {
                assert!(
                    remaining.is_empty(),
                    "wildcard segment `{segment}` must end the route pattern"
                );
                self.wildcard_child
                    .get_or_insert_with(|| Box::new(Self::with_kind(segment.clone(), kind.clone())))
                    .insert_segments(remaining, methods);
            }
        }
    }

    /// Finds the value answering `method` on a concrete request path.
    ///
    /// Empty segments are ignored, so `/a//b/` and `/a/b` are the same path.
    /// Candidates are tried static first, then param, then wildcard. A
    /// candidate whose path matches but which lacks `method` is skipped and
    /// its registered methods are merged into `allowed`.
    pub fn match_path(
        &self,
        method: &Method,
        path: &str,
        allowed: &mut Vec<Method>,
    ) -> Option<(&T, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let value = self.match_segments(method, &segments, &mut params, allowed)?;
        Some((value, params))
    }

    fn match_segments<'a>(
        &'a self,
        method: &Method,
        segments: &[&str],
        params: &mut Params,
        allowed: &mut Vec<Method>,
    ) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().and_then(|m| accept(m, method, allowed));
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(method, remaining, params, allowed) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(method, remaining, params, allowed) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(methods)) = (&child.kind, &child.methods) {
                if let Some(found) = accept(methods, method, allowed) {
                    params.push(name.clone(), segments.join("/"));
                    return Some(found);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn accept<'a, T>(
    methods: &'a MethodRouter<T>,
    method: &Method,
    allowed: &mut Vec<Method>,
) -> Option<&'a T> {
    let value = methods.value_for(method);
    if value.is_none() {
        for m in methods.allowed_methods() {
            if !allowed.contains(&m) {
                allowed.push(m);
            }
        }
    }
    value
}

fn parse_pattern(path: &str) -> Vec<(String, SegmentKind)> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix('*') {
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static
            };
            (s.to_string(), kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(root: &'a Node<&'static str>, path: &str) -> Option<(&'a str, Params)> {
        root.match_path(&Method::GET, path, &mut Vec::new())
            .map(|(v, p)| (*v, p))
    }

    #[test]
    fn test_parse_pattern() {
        let segments = parse_pattern("/api/category/{slug}/filters");
        assert_eq!(
            segments,
            vec![
                ("api".to_string(), SegmentKind::Static),
                ("category".to_string(), SegmentKind::Static),
                ("{slug}".to_string(), SegmentKind::Param("slug".to_string())),
                ("filters".to_string(), SegmentKind::Static),
            ]
        );
        assert_eq!(
            parse_pattern("/api/order/*rest")[2].1,
            SegmentKind::Wildcard("rest".to_string())
        );
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        root.insert("/c", MethodRouter::new().get("c"));
        root.insert("/a", MethodRouter::new().get("a"));
        root.insert("/b", MethodRouter::new().get("b"));
        let order: Vec<_> = root.static_children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_static_beats_param() {
        let mut root = Node::root();
        root.insert("/api/category/{slug}", MethodRouter::new().get("get"));
        root.insert("/api/category/search", MethodRouter::new().get("search"));

        assert_eq!(lookup(&root, "/api/category/search").unwrap().0, "search");
        let (value, params) = lookup(&root, "/api/category/boots").unwrap();
        assert_eq!(value, "get");
        assert_eq!(params.get("slug"), Some("boots"));
    }

    #[test]
    fn test_falls_back_to_param_when_static_subtree_misses() {
        let mut root = Node::root();
        root.insert("/api/category/filters/search", MethodRouter::new().get("search"));
        root.insert("/api/category/{slug}", MethodRouter::new().get("get"));
        root.insert("/api/category/{slug}/filters", MethodRouter::new().get("filters"));

        let (value, params) = lookup(&root, "/api/category/filters").unwrap();
        assert_eq!(value, "get");
        assert_eq!(params.get("slug"), Some("filters"));

        let (value, params) = lookup(&root, "/api/category/filters/filters").unwrap();
        assert_eq!(value, "filters");
        assert_eq!(params.get("slug"), Some("filters"));
    }

    #[test]
    fn test_backtracking_discards_abandoned_params() {
        let mut root = Node::root();
        root.insert("/a/{x}/only", MethodRouter::new().get("deep"));
        root.insert("/a/*rest", MethodRouter::new().get("rest"));

        let (value, params) = lookup(&root, "/a/1/other").unwrap();
        assert_eq!(value, "rest");
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("1/other"));
    }

    #[test]
    fn test_wildcard_joins_tail() {
        let mut root = Node::root();
        root.insert("/api/order/me", MethodRouter::new().get("me"));
        root.insert("/api/order/*rest", MethodRouter::new().get("item"));

        assert_eq!(lookup(&root, "/api/order/me").unwrap().0, "me");
        let (value, params) = lookup(&root, "/api/order/12/x").unwrap();
        assert_eq!(value, "item");
        assert_eq!(params.get("rest"), Some("12/x"));
    }

    #[test]
    fn test_empty_segments_ignored() {
        let mut root = Node::root();
        root.insert("/api/order", MethodRouter::new().get("list"));
        assert_eq!(lookup(&root, "//api///order/").unwrap().0, "list");
    }

    #[test]
    fn test_intermediate_node_is_not_a_route() {
        let mut root = Node::root();
        root.insert("/api/category/search", MethodRouter::new().get("search"));
        let mut allowed = Vec::new();
        assert!(root.match_path(&Method::GET, "/api/category", &mut allowed).is_none());
        assert!(allowed.is_empty());
    }

    #[test]
    fn test_static_leaf_without_method_falls_back_to_param() {
        let mut root = Node::root();
        root.insert("/api/category/search", MethodRouter::new().get("search"));
        root.insert(
            "/api/category/{slug}",
            MethodRouter::new().get("get").delete("delete"),
        );

        let mut allowed = Vec::new();
        let (value, params) = root
            .match_path(&Method::DELETE, "/api/category/search", &mut allowed)
            .unwrap();
        assert_eq!(*value, "delete");
        assert_eq!(params.get("slug"), Some("search"));
        assert_eq!(allowed, vec![Method::GET]);
    }

    #[test]
    fn test_wildcard_skipped_when_method_missing() {
        let mut root = Node::root();
        root.insert("/files/*rest", MethodRouter::new().get("read"));

        let mut allowed = Vec::new();
        assert!(root.match_path(&Method::POST, "/files/a/b", &mut allowed).is_none());
        assert_eq!(allowed, vec![Method::GET]);
    }

    #[test]
    #[should_panic(expected = "must end the route pattern")]
    fn test_wildcard_must_be_last() {
        let mut root = Node::<&str>::root();
        root.insert("/files/*rest/more", MethodRouter::new().get("x"));
    }
}
