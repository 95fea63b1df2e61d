//! Route storage and lookup.
//!
//! # Responsibilities
//! - Store route entries in registration order
//! - Collect every entry matching a method and pathname
//! - Report whether the path matched at all, to tell 404 from 405
//!
//! # Design Decisions
//! - Filled during registration, read-only while serving
//! - O(n) scan; every match is collected, nothing is ranked
//! - Middleware entries ride along but never decide 404 vs 405
//! - HEAD falls back to GET when no endpoint answers HEAD itself

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use super::paths::merge_paths;
use super::pattern::{is_pattern, CompiledPattern, PatternError};
use crate::middleware::Handler;

/// Method filter of a route entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMethod {
    /// Participates for every request method.
    All,
    /// Participates for one method only.
    Only(Method),
}

impl RouteMethod {
    fn accepts(&self, method: &Method) -> bool {
        match self {
            RouteMethod::All => true,
            RouteMethod::Only(m) => m == method,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::All => f.write_str("ALL"),
            RouteMethod::Only(m) => write!(f, "{m}"),
        }
    }
}

/// Path side of a route entry.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// The literal `*`: matches every path.
    Wildcard,
    /// Matches one pathname exactly.
    Exact(String),
    /// Placeholder pattern.
    Pattern(CompiledPattern),
    /// Matches a literal prefix and every path beneath it.
    Scope(String),
}

impl RoutePath {
    /// Classify a path string, compiling it if it holds placeholders.
    pub fn parse(path: &str) -> Result<Self, PatternError> {
        if path == "*" {
            Ok(RoutePath::Wildcard)
        } else if is_pattern(path) {
            Ok(RoutePath::Pattern(CompiledPattern::compile(path)?))
        } else {
            Ok(RoutePath::Exact(path.to_string()))
        }
    }

    /// A prefix scope; the root prefix is the wildcard.
    pub fn scope(prefix: &str) -> Self {
        let prefix = merge_paths(prefix, "");
        if prefix == "/" {
            RoutePath::Wildcard
        } else {
            RoutePath::Scope(prefix)
        }
    }

    /// The path string this entry was registered with.
    pub fn source(&self) -> &str {
        match self {
            RoutePath::Wildcard => "*",
            RoutePath::Exact(path) | RoutePath::Scope(path) => path,
            RoutePath::Pattern(pattern) => pattern.source(),
        }
    }

    /// The same path moved beneath `prefix`.
    pub fn rebase(&self, prefix: &str) -> Result<Self, PatternError> {
        match self {
            RoutePath::Wildcard => Ok(RoutePath::scope(prefix)),
            RoutePath::Scope(scope) => Ok(RoutePath::scope(&merge_paths(prefix, scope))),
            RoutePath::Exact(path) => RoutePath::parse(&merge_paths(prefix, path)),
            RoutePath::Pattern(pattern) => RoutePath::parse(&merge_paths(prefix, pattern.source())),
        }
    }

    /// Match `path`, returning captured params on success.
    fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        match self {
            RoutePath::Wildcard => Some(Vec::new()),
            RoutePath::Exact(exact) => (exact == path).then(Vec::new),
            RoutePath::Pattern(pattern) => pattern.captures(path),
            RoutePath::Scope(prefix) => {
                let beneath = path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
                beneath.then(Vec::new)
            }
        }
    }
}

/// Role of an entry in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Registered with `use`; wraps whatever else matches.
    Middleware,
    /// Registered for a path and method; counts toward 404/405.
    Endpoint,
}

/// One registered `(method, path, handler)` tuple.
pub struct RouteEntry<S> {
    pub method: RouteMethod,
    pub path: RoutePath,
    pub kind: EntryKind,
    pub handler: Handler<S>,
}

impl<S> Clone for RouteEntry<S> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            kind: self.kind,
            handler: self.handler.clone(),
        }
    }
}

impl<S> fmt::Debug for RouteEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("path", &self.path.source())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Outcome of matching one request against the table.
pub struct MatchResult<S> {
    /// Params from every collected pattern entry, decoded.
    pub params: HashMap<String, String>,
    /// Collected handlers in registration order.
    pub handlers: Vec<Handler<S>>,
    /// Some endpoint matched the path, whatever its method.
    pub path_matched: bool,
    /// Some endpoint matched both path and method.
    pub method_matched: bool,
}

impl<S> MatchResult<S> {
    fn empty() -> Self {
        Self {
            params: HashMap::new(),
            handlers: Vec::new(),
            path_matched: false,
            method_matched: false,
        }
    }
}

/// Ordered route table.
pub struct Router<S> {
    routes: Vec<RouteEntry<S>>,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<S> Clone for Router<S> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
        }
    }
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; evaluation follows insertion order.
    pub fn add(&mut self, entry: RouteEntry<S>) {
        tracing::debug!(
            method = %entry.method,
            path = %entry.path.source(),
            kind = ?entry.kind,
            "Route registered"
        );
        self.routes.push(entry);
    }

    pub fn routes(&self) -> &[RouteEntry<S>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Collect every entry matching `method` and `path`.
    pub fn match_route(&self, method: &Method, path: &str) -> MatchResult<S> {
        let result = self.collect(method, path);
        if method == Method::HEAD && !result.method_matched {
            let as_get = self.collect(&Method::GET, path);
            if as_get.method_matched {
                return as_get;
            }
        }
        result
    }

    fn collect(&self, method: &Method, path: &str) -> MatchResult<S> {
        let mut result = MatchResult::empty();
        for entry in &self.routes {
            let Some(params) = entry.path.matches(path) else {
                continue;
            };
            let endpoint = entry.kind == EntryKind::Endpoint;
            if endpoint {
                result.path_matched = true;
            }
            if !entry.method.accepts(method) {
                continue;
            }
            if endpoint {
                result.method_matched = true;
            }
            result.params.extend(params);
            result.handlers.push(entry.handler.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{text, Context};
    use crate::middleware::handler_fn;
    use std::sync::Arc;

    fn handler() -> Handler<()> {
        handler_fn(|_ctx: &mut Context<()>| Box::pin(async move { Ok(text("ok")) }))
    }

    fn entry(method: RouteMethod, path: &str, kind: EntryKind) -> RouteEntry<()> {
        RouteEntry {
            method,
            path: RoutePath::parse(path).unwrap(),
            kind,
            handler: handler(),
        }
    }

    fn get(path: &str) -> RouteEntry<()> {
        entry(RouteMethod::Only(Method::GET), path, EntryKind::Endpoint)
    }

    #[test]
    fn test_parse_classifies_paths() {
        assert!(matches!(RoutePath::parse("*").unwrap(), RoutePath::Wildcard));
        assert!(matches!(RoutePath::parse("/a").unwrap(), RoutePath::Exact(_)));
        assert!(matches!(RoutePath::parse("/a/:id").unwrap(), RoutePath::Pattern(_)));
        assert!(matches!(RoutePath::scope("/"), RoutePath::Wildcard));
        assert!(matches!(RoutePath::scope(""), RoutePath::Wildcard));
        assert!(matches!(RoutePath::scope("/api/"), RoutePath::Scope(p) if p == "/api"));
    }

    #[test]
    fn test_scope_matches_prefix_and_below() {
        let scope = RoutePath::scope("/api");
        assert!(scope.matches("/api").is_some());
        assert!(scope.matches("/api/users").is_some());
        assert!(scope.matches("/apiary").is_none());
        assert!(scope.matches("/").is_none());
    }

    #[test]
    fn test_rebase() {
        let exact = RoutePath::parse("/api/users").unwrap().rebase("/v1").unwrap();
        assert_eq!(exact.source(), "/v1/api/users");

        let pattern = RoutePath::parse("/users/:id").unwrap().rebase("/main/v1").unwrap();
        assert!(matches!(&pattern, RoutePath::Pattern(_)));
        assert_eq!(pattern.source(), "/main/v1/users/:id");

        let wildcard = RoutePath::Wildcard.rebase("/v1").unwrap();
        assert!(matches!(wildcard, RoutePath::Scope(p) if p == "/v1"));

        let scope = RoutePath::scope("/admin").rebase("/v1").unwrap();
        assert_eq!(scope.source(), "/v1/admin");

        let root = RoutePath::Wildcard.rebase("/").unwrap();
        assert!(matches!(root, RoutePath::Wildcard));
    }

    #[test]
    fn test_collects_in_registration_order() {
        let mut router = Router::new();
        let first = handler();
        let second = handler();
        router.add(RouteEntry {
            method: RouteMethod::All,
            path: RoutePath::Wildcard,
            kind: EntryKind::Middleware,
            handler: Arc::clone(&first),
        });
        router.add(RouteEntry {
            method: RouteMethod::Only(Method::GET),
            path: RoutePath::parse("/x").unwrap(),
            kind: EntryKind::Endpoint,
            handler: Arc::clone(&second),
        });

        let result = router.match_route(&Method::GET, "/x");
        assert_eq!(result.handlers.len(), 2);
        assert!(Arc::ptr_eq(&result.handlers[0], &first));
        assert!(Arc::ptr_eq(&result.handlers[1], &second));
        assert!(result.path_matched);
        assert!(result.method_matched);
    }

    #[test]
    fn test_method_mismatch_is_reported() {
        let mut router = Router::new();
        router.add(get("/x"));

        let result = router.match_route(&Method::PUT, "/x");
        assert!(result.handlers.is_empty());
        assert!(result.path_matched);
        assert!(!result.method_matched);

        let result = router.match_route(&Method::GET, "/y");
        assert!(!result.path_matched);
        assert!(!result.method_matched);
    }

    #[test]
    fn test_middleware_does_not_count_as_path_match() {
        let mut router = Router::new();
        router.add(entry(RouteMethod::All, "*", EntryKind::Middleware));
        router.add(get("/x"));

        let result = router.match_route(&Method::PUT, "/x");
        assert_eq!(result.handlers.len(), 1);
        assert!(result.path_matched);
        assert!(!result.method_matched);

        let result = router.match_route(&Method::GET, "/nope");
        assert_eq!(result.handlers.len(), 1);
        assert!(!result.path_matched);
    }

    #[test]
    fn test_all_method_endpoint_matches_any_verb() {
        let mut router = Router::new();
        router.add(entry(RouteMethod::All, "/any", EntryKind::Endpoint));

        let result = router.match_route(&Method::DELETE, "/any");
        assert!(result.method_matched);
        assert_eq!(result.handlers.len(), 1);
    }

    #[test]
    fn test_params_are_merged_and_decoded() {
        let mut router = Router::new();
        router.add(entry(RouteMethod::All, "/users/:id/*", EntryKind::Middleware));
        router.add(get("/users/:id/posts/:post"));

        let result = router.match_route(&Method::GET, "/users/a%20b/posts/9");
        assert_eq!(result.handlers.len(), 2);
        assert_eq!(result.params["id"], "a b");
        assert_eq!(result.params["post"], "9");
    }

    #[test]
    fn test_params_of_skipped_entries_are_ignored() {
        let mut router = Router::new();
        router.add(entry(
            RouteMethod::Only(Method::POST),
            "/items/:other",
            EntryKind::Endpoint,
        ));
        router.add(get("/items/:id"));

        let result = router.match_route(&Method::GET, "/items/3");
        assert_eq!(result.params.len(), 1);
        assert_eq!(result.params["id"], "3");
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut router = Router::new();
        router.add(get("/x"));

        let result = router.match_route(&Method::HEAD, "/x");
        assert!(result.method_matched);
        assert_eq!(result.handlers.len(), 1);
    }

    #[test]
    fn test_explicit_head_wins_over_get() {
        let mut router = Router::new();
        let head = handler();
        router.add(get("/x"));
        router.add(RouteEntry {
            method: RouteMethod::Only(Method::HEAD),
            path: RoutePath::parse("/x").unwrap(),
            kind: EntryKind::Endpoint,
            handler: Arc::clone(&head),
        });

        let result = router.match_route(&Method::HEAD, "/x");
        assert_eq!(result.handlers.len(), 1);
        assert!(Arc::ptr_eq(&result.handlers[0], &head));
    }
}
