//! The application object.
//!
//! # Responsibilities
//! - Route registration with base-path merging
//! - Sub-application mounting with path rebasing
//! - Per-request dispatch: cache lookup, match, compose, invoke
//! - Terminal fallbacks (404, 405) and error recovery (500, error routes)
//!
//! # Design Decisions
//! - Registration is synchronous and chainable; pattern errors are kept
//!   and reported once by `handler()`
//! - `handler()` snapshots the tables; later registrations do not affect
//!   handlers already built
//! - Every failure resolves to a response; nothing escapes `AppHandler::call`

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use futures_util::FutureExt;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use super::cache::RouteCache;
use super::definition::RouteDefinition;
use super::{BuildError, ServeError};
use crate::config::AppConfig;
use crate::config::schema::DEFAULT_ROUTE_CACHE_CAPACITY;
use crate::error::HandlerError;
use crate::http::response::{internal_error, method_not_allowed, not_found, status_text, strip_body};
use crate::http::server::Server;
use crate::http::Context;
use crate::middleware::{compose, handler_fn, BoxFuture, Handler, HandlerResult};
use crate::net::{self, ListenOptions};
use crate::routing::{
    collapse_slashes, is_pattern, merge_paths, EntryKind, PatternError, RouteEntry, RouteMethod,
    RoutePath, Router,
};

/// Route registration and request dispatch for one application.
///
/// `S` is the per-request state type; every request starts with
/// `S::default()`.
pub struct App<S> {
    base_path: String,
    router: Router<S>,
    error_router: Router<S>,
    not_found: Option<Handler<S>>,
    cache_capacity: usize,
    errors: Vec<PatternError>,
}

impl<S: Default + Send + 'static> Default for App<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default + Send + 'static> App<S> {
    /// An application without a base path.
    pub fn new() -> Self {
        Self {
            base_path: String::new(),
            router: Router::new(),
            error_router: Router::new(),
            not_found: None,
            cache_capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
            errors: Vec::new(),
        }
    }

    /// An application whose routes all live under `base_path`.
    pub fn with_base_path(base_path: &str) -> Self {
        let mut app = Self::new();
        app.base_path = base_path.to_string();
        app
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut app = Self::with_base_path(&config.base_path);
        app.cache_capacity = config.route_cache_capacity;
        app
    }

    /// Bound the route-result cache. 0 disables it.
    pub fn route_cache_capacity(&mut self, capacity: usize) -> &mut Self {
        self.cache_capacity = capacity;
        self
    }

    /// Registered entries in evaluation order.
    pub fn routes(&self) -> &[RouteEntry<S>] {
        self.router.routes()
    }

    /// Register global middleware: every method, every path, regardless of
    /// the base path.
    pub fn use_middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.router.add(RouteEntry {
            method: RouteMethod::All,
            path: RoutePath::Wildcard,
            kind: EntryKind::Middleware,
            handler: handler_fn(f),
        });
        self
    }

    /// Register middleware for `path` (under the base path) and everything
    /// beneath it. A pattern path matches as a pattern instead.
    pub fn use_at<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        match self.scoped_path(path) {
            Ok(path) => {
                self.router.add(RouteEntry {
                    method: RouteMethod::All,
                    path,
                    kind: EntryKind::Middleware,
                    handler: handler_fn(f),
                });
                self
            }
            Err(error) => self.reject(error),
        }
    }

    pub fn get<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::GET), path, handler_fn(f))
    }

    pub fn post<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::POST), path, handler_fn(f))
    }

    pub fn put<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::PUT), path, handler_fn(f))
    }

    pub fn patch<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::PATCH), path, handler_fn(f))
    }

    pub fn delete<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::DELETE), path, handler_fn(f))
    }

    pub fn head<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::HEAD), path, handler_fn(f))
    }

    pub fn options<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::Only(Method::OPTIONS), path, handler_fn(f))
    }

    /// Register for every method.
    pub fn all<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.add(RouteMethod::All, path, handler_fn(f))
    }

    /// Register an endpoint from an already boxed handler.
    pub fn add(&mut self, method: RouteMethod, path: &str, handler: Handler<S>) -> &mut Self {
        match RoutePath::parse(&merge_paths(&self.base_path, path)) {
            Ok(path) => {
                self.router.add(RouteEntry {
                    method,
                    path,
                    kind: EntryKind::Endpoint,
                    handler,
                });
                self
            }
            Err(error) => self.reject(error),
        }
    }

    /// Register a definition: one handler for all methods, or a verb table.
    pub fn route(&mut self, path: &str, definition: impl Into<RouteDefinition<S>>) -> &mut Self {
        match definition.into() {
            RouteDefinition::Any(handler) => self.add(RouteMethod::All, path, handler),
            RouteDefinition::Methods(methods) => {
                for (method, handler) in methods.into_entries() {
                    self.add(RouteMethod::Only(method), path, handler);
                }
                self
            }
        }
    }

    /// Mount `inner` beneath `prefix`.
    ///
    /// Inner routes land at `base_path + prefix + inner.base_path + route`.
    /// Entries are appended in the inner app's order, so middleware
    /// registered on this app before the mount wraps the inner chain.
    /// Inner global middleware is scoped to the mount point. The inner
    /// `not_found` override is dropped; this app owns the terminal 404.
    pub fn mount_app(&mut self, prefix: &str, inner: App<S>) -> &mut Self {
        let mount_point = merge_paths(&self.base_path, prefix);
        tracing::debug!(
            mount_point = %mount_point,
            routes = inner.router.len(),
            error_routes = inner.error_router.len(),
            "Mounting application"
        );

        self.errors.extend(inner.errors);
        for entry in inner.router.routes() {
            match rebased(entry, &mount_point) {
                Ok(entry) => self.router.add(entry),
                Err(error) => self.errors.push(error),
            }
        }
        for entry in inner.error_router.routes() {
            match rebased(entry, &mount_point) {
                Ok(entry) => self.error_router.add(entry),
                Err(error) => self.errors.push(error),
            }
        }
        self
    }

    /// Override the response for unmatched paths and for the typed
    /// not-found signal ([`HttpError::not_found`](crate::HttpError::not_found)).
    pub fn not_found<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.not_found = Some(handler_fn(f));
        self
    }

    /// Register an error route for `path` (under the base path) and
    /// everything beneath it. It runs with `ctx.error` set when a handler
    /// on a matching path fails.
    pub fn on_error<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        match self.scoped_path(path) {
            Ok(path) => {
                self.error_router.add(RouteEntry {
                    method: RouteMethod::All,
                    path,
                    kind: EntryKind::Endpoint,
                    handler: handler_fn(f),
                });
                self
            }
            Err(error) => self.reject(error),
        }
    }

    /// Build the request handler from the routes registered so far.
    pub fn handler(&self) -> Result<AppHandler<S>, BuildError> {
        if !self.errors.is_empty() {
            return Err(BuildError {
                errors: self.errors.clone(),
            });
        }

        tracing::debug!(
            base_path = %self.base_path,
            routes = self.router.len(),
            error_routes = self.error_router.len(),
            cache_capacity = self.cache_capacity,
            "Application handler built"
        );

        Ok(AppHandler {
            shared: Arc::new(Shared {
                router: self.router.clone(),
                error_router: self.error_router.clone(),
                not_found: self.not_found.clone(),
                method_not_allowed: handler_fn(|_ctx| Box::pin(async move { Ok(method_not_allowed()) })),
                default_not_found: handler_fn(|_ctx| Box::pin(async move { Ok(not_found()) })),
                error_fallback: handler_fn(|ctx| {
                    Box::pin(async move {
                        Ok(ctx
                            .error
                            .as_ref()
                            .map_or_else(internal_error, default_error_response))
                    })
                }),
                cache: RouteCache::new(self.cache_capacity),
            }),
        })
    }

    /// Bind a listener for this application without serving yet.
    pub async fn bind(&self, options: &ListenOptions) -> Result<Server<S>, ServeError> {
        let handler = self.handler()?;
        let listener = net::bind(options).await?;
        Ok(Server::new(listener, handler))
    }

    /// Bind and serve until `shutdown` fires.
    pub async fn listen(
        &self,
        options: &ListenOptions,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let server = self.bind(options).await?;
        server.run(shutdown).await?;
        Ok(())
    }

    /// `path` under the base path as a prefix scope, or as a pattern when
    /// it holds placeholders.
    fn scoped_path(&self, path: &str) -> Result<RoutePath, PatternError> {
        let merged = merge_paths(&self.base_path, path);
        if is_pattern(&merged) {
            RoutePath::parse(&merged)
        } else {
            Ok(RoutePath::scope(&merged))
        }
    }

    fn reject(&mut self, error: PatternError) -> &mut Self {
        tracing::warn!(error = %error, "Route rejected");
        self.errors.push(error);
        self
    }
}

fn rebased<S>(entry: &RouteEntry<S>, prefix: &str) -> Result<RouteEntry<S>, PatternError> {
    Ok(RouteEntry {
        method: entry.method.clone(),
        path: entry.path.rebase(prefix)?,
        kind: entry.kind,
        handler: Arc::clone(&entry.handler),
    })
}

/// Response used when no error route takes over.
fn default_error_response(error: &HandlerError) -> Response {
    let status = error.status();
    match error {
        HandlerError::Http(http) => status_text(status, http.message.clone()),
        _ if status == StatusCode::INTERNAL_SERVER_ERROR => internal_error(),
        _ => status_text(status, status.canonical_reason().unwrap_or_default()),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `handler` against `ctx`, turning a panic into an error.
async fn invoke<S: Send + 'static>(handler: &Handler<S>, ctx: &mut Context<S>) -> HandlerResult {
    match AssertUnwindSafe(handler.call(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panic(panic_message(payload))),
    }
}

/// Memoized outcome of matching one `(method, path)`.
struct Resolved<S> {
    params: HashMap<String, String>,
    chain: Handler<S>,
    fallback: Handler<S>,
}

struct Shared<S> {
    router: Router<S>,
    error_router: Router<S>,
    not_found: Option<Handler<S>>,
    method_not_allowed: Handler<S>,
    default_not_found: Handler<S>,
    error_fallback: Handler<S>,
    cache: RouteCache<Arc<Resolved<S>>>,
}

/// The `(Request) -> Response` function serving one application.
///
/// Cloning is cheap; clones share the route tables and the cache.
pub struct AppHandler<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for AppHandler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: Default + Send + 'static> AppHandler<S> {
    /// Serve one request.
    pub async fn call(&self, request: Request) -> Response {
        let span = tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        );
        self.dispatch(request).instrument(span).await
    }

    /// Number of memoized route results.
    pub fn cached_routes(&self) -> usize {
        self.shared.cache.len()
    }

    async fn dispatch(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = collapse_slashes(request.uri().path()).into_owned();
        let resolved = self.resolve(&method, &path);

        let mut ctx = match Context::new(request, Arc::clone(&resolved.fallback)) {
            Ok(ctx) => ctx,
            Err(error) => {
                tracing::warn!(error = %error, "Rejecting request with unusable URL");
                return default_error_response(&error);
            }
        };
        ctx.params = resolved.params.clone();

        let result = invoke(&resolved.chain, &mut ctx).await;
        let response = match result {
            Ok(response) => response,
            Err(error) => self.recover(ctx, &path, error).await,
        };

        if method == Method::HEAD {
            strip_body(response)
        } else {
            response
        }
    }

    /// Cached match result, or a fresh match stored in the cache.
    fn resolve(&self, method: &Method, path: &str) -> Arc<Resolved<S>> {
        if let Some(hit) = self.shared.cache.get(method, path) {
            tracing::trace!(path, "Route cache hit");
            return hit;
        }

        let matched = self.shared.router.match_route(method, path);
        let fallback = if matched.path_matched && !matched.method_matched {
            tracing::debug!(path, "Path matched without method, answering 405");
            Arc::clone(&self.shared.method_not_allowed)
        } else {
            if !matched.path_matched {
                tracing::debug!(path, "No route matched");
            }
            self.not_found_handler()
        };

        let resolved = Arc::new(Resolved {
            params: matched.params,
            chain: compose(matched.handlers),
            fallback,
        });
        tracing::debug!(path, "Route cache miss");
        self.shared
            .cache
            .insert(method.clone(), path.to_string(), Arc::clone(&resolved));
        resolved
    }

    fn not_found_handler(&self) -> Handler<S> {
        match &self.shared.not_found {
            Some(handler) => Arc::clone(handler),
            None => Arc::clone(&self.shared.default_not_found),
        }
    }

    /// Turn a failed chain into a response.
    ///
    /// Not-found signals go to the `not_found` override when there is one;
    /// everything else goes to the matching error routes. Without either,
    /// the error's default response is used.
    async fn recover(&self, mut ctx: Context<S>, path: &str, error: HandlerError) -> Response {
        let recovery = match (&self.shared.not_found, error.is_not_found()) {
            (Some(handler), true) => {
                tracing::debug!(path, "Not-found signal raised by handler");
                Some(Arc::clone(handler))
            }
            _ => {
                if error.is_not_found() {
                    tracing::debug!(path, "Not-found signal raised by handler");
                } else {
                    tracing::error!(path, error = %error, "Handler failed");
                }
                let matched = self.shared.error_router.match_route(ctx.method(), path);
                if matched.handlers.is_empty() {
                    None
                } else {
                    ctx.params.extend(matched.params);
                    Some(compose(matched.handlers))
                }
            }
        };

        let Some(recovery) = recovery else {
            return default_error_response(&error);
        };

        ctx.error = Some(error);
        ctx.restart(Arc::clone(&self.shared.error_fallback));

        match invoke(&recovery, &mut ctx).await {
            Ok(response) => response,
            Err(failure) => {
                tracing::error!(path, error = %failure, "Error handler failed");
                internal_error()
            }
        }
    }
}
