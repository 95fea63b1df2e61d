//! The middleware function type.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::response::Response;

use crate::error::HandlerError;
use crate::http::Context;

/// Boxed future returned by middleware.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every middleware resolves to.
pub type HandlerResult = Result<Response, HandlerError>;

/// A step in a request's chain.
///
/// A middleware either answers with a response or delegates with
/// [`Context::next`] and post-processes what comes back.
///
/// Any `for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult>` is a
/// middleware, so closures work directly:
///
/// ```
/// use stackroute::{handler_fn, text, Handler};
///
/// let hello: Handler<()> = handler_fn(|_ctx| Box::pin(async move { Ok(text("hello")) }));
/// ```
pub trait Middleware<S>: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult>;
}

impl<S, F> Middleware<S> for F
where
    F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        self(ctx)
    }
}

/// Shared, type-erased middleware.
pub type Handler<S> = Arc<dyn Middleware<S>>;

/// Box a middleware function into a [`Handler`].
pub fn handler_fn<S, F>(f: F) -> Handler<S>
where
    F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(f)
}
