//! Route definitions for `App::route`.
//!
//! A definition is either one handler for every method or a fixed table
//! with one slot per verb. A HEAD request to a table without a `head`
//! slot is served by `get`, body stripped.

use axum::http::Method;

use crate::http::Context;
use crate::middleware::{handler_fn, BoxFuture, Handler, HandlerResult};

/// What `App::route` registers for one path.
pub enum RouteDefinition<S> {
    /// One handler answering every method.
    Any(Handler<S>),
    /// Per-verb handlers.
    Methods(MethodHandlers<S>),
}

impl<S> RouteDefinition<S> {
    /// A definition answering every method with `f`.
    pub fn any<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        RouteDefinition::Any(handler_fn(f))
    }
}

impl<S> From<MethodHandlers<S>> for RouteDefinition<S> {
    fn from(methods: MethodHandlers<S>) -> Self {
        RouteDefinition::Methods(methods)
    }
}

impl<S> From<Handler<S>> for RouteDefinition<S> {
    fn from(handler: Handler<S>) -> Self {
        RouteDefinition::Any(handler)
    }
}

/// Fixed verb → handler table.
pub struct MethodHandlers<S> {
    pub get: Option<Handler<S>>,
    pub head: Option<Handler<S>>,
    pub post: Option<Handler<S>>,
    pub put: Option<Handler<S>>,
    pub patch: Option<Handler<S>>,
    pub delete: Option<Handler<S>>,
    pub options: Option<Handler<S>>,
}

impl<S> Default for MethodHandlers<S> {
    fn default() -> Self {
        Self {
            get: None,
            head: None,
            post: None,
            put: None,
            patch: None,
            delete: None,
            options: None,
        }
    }
}

impl<S> MethodHandlers<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.get = Some(handler_fn(f));
        self
    }

    pub fn head<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.head = Some(handler_fn(f));
        self
    }

    pub fn post<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.post = Some(handler_fn(f));
        self
    }

    pub fn put<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.put = Some(handler_fn(f));
        self
    }

    pub fn patch<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.patch = Some(handler_fn(f));
        self
    }

    pub fn delete<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.delete = Some(handler_fn(f));
        self
    }

    pub fn options<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.options = Some(handler_fn(f));
        self
    }

    /// Filled slots in registration order.
    pub fn into_entries(self) -> Vec<(Method, Handler<S>)> {
        [
            (Method::GET, self.get),
            (Method::HEAD, self.head),
            (Method::POST, self.post),
            (Method::PUT, self.put),
            (Method::PATCH, self.patch),
            (Method::DELETE, self.delete),
            (Method::OPTIONS, self.options),
        ]
        .into_iter()
        .filter_map(|(method, handler)| handler.map(|h| (method, h)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.get.is_none()
            && self.head.is_none()
            && self.post.is_none()
            && self.put.is_none()
            && self.patch.is_none()
            && self.delete.is_none()
            && self.options.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::text;

    #[test]
    fn test_entries_follow_verb_order() {
        let methods: MethodHandlers<()> = MethodHandlers::new()
            .post(|_ctx| Box::pin(async move { Ok(text("post")) }))
            .get(|_ctx| Box::pin(async move { Ok(text("get")) }));

        let verbs: Vec<Method> = methods.into_entries().into_iter().map(|(m, _)| m).collect();
        assert_eq!(verbs, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_empty_table() {
        let methods: MethodHandlers<()> = MethodHandlers::default();
        assert!(methods.is_empty());
        assert!(methods.into_entries().is_empty());
    }

    #[test]
    fn test_conversions() {
        let any: RouteDefinition<()> = RouteDefinition::any(|_ctx| Box::pin(async move { Ok(text("")) }));
        assert!(matches!(any, RouteDefinition::Any(_)));

        let table: RouteDefinition<()> = MethodHandlers::new().into();
        assert!(matches!(table, RouteDefinition::Methods(_)));
    }
}
