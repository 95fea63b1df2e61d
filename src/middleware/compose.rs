//! Onion-model composition.
//!
//! # Responsibilities
//! - Turn an ordered list of middleware into one middleware
//! - Advance exactly one step per `next()` call
//! - Fall through to the enclosing chain once the list is exhausted
//! - Reject a second `next()` from the same middleware turn
//!
//! # Design Decisions
//! - The cursor lives on the [`Context`] as a stack of frames, one per
//!   running composed chain; the chain itself is immutable and shareable
//! - `current` is the index of the middleware whose turn it is, `reached`
//!   the furthest index already dispatched; `next()` targets `current + 1`
//!   and must move past `reached`

use std::sync::Arc;

use super::handler::{BoxFuture, Handler, HandlerResult, Middleware};
use crate::error::HandlerError;
use crate::http::Context;

/// Cursor state of one running chain.
pub(crate) struct Frame<S> {
    pub(crate) chain: Arc<[Handler<S>]>,
    pub(crate) current: Option<usize>,
    pub(crate) reached: Option<usize>,
}

impl<S> Frame<S> {
    fn new(chain: Arc<[Handler<S>]>) -> Self {
        Self {
            chain,
            current: None,
            reached: None,
        }
    }
}

/// A composed list of middleware.
pub struct Chain<S> {
    handlers: Arc<[Handler<S>]>,
}

impl<S> Chain<S> {
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<S: Send + 'static> Middleware<S> for Chain<S> {
    fn call<'a>(&'a self, ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            ctx.frames.push(Frame::new(Arc::clone(&self.handlers)));
            let result = ctx.next().await;
            ctx.frames.pop();
            result
        })
    }
}

/// Compose middleware into a single handler.
///
/// A single handler is returned unchanged. Otherwise the returned handler
/// runs the list in order; once the last one delegates, control continues
/// with whatever `next()` meant before the chain started.
pub fn compose<S: Send + 'static>(mut handlers: Vec<Handler<S>>) -> Handler<S> {
    if handlers.len() == 1 {
        if let Some(only) = handlers.pop() {
            return only;
        }
    }
    Arc::new(Chain {
        handlers: handlers.into(),
    })
}

impl<S: Send + 'static> Context<S> {
    /// Delegate to the next middleware.
    ///
    /// Past the end of the innermost chain this continues in the enclosing
    /// chain, and finally runs the context's fallback (404 by default).
    /// Calling it twice from the same middleware turn fails with
    /// [`HandlerError::NextCalledTwice`].
    pub fn next(&mut self) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let depth = self.frames.len();
            if depth == 0 {
                return self.run_fallback().await;
            }

            let frame = &mut self.frames[depth - 1];
            let target = frame.current.map_or(0, |i| i + 1);
            if frame.reached.is_some_and(|reached| target <= reached) {
                tracing::error!(index = target, "next() called multiple times");
                return Err(HandlerError::NextCalledTwice);
            }
            frame.reached = Some(target);

            let handler = frame.chain.get(target).cloned();
            match handler {
                Some(handler) => {
                    let previous = frame.current.replace(target);
                    let result = handler.call(self).await;
                    if let Some(frame) = self.frames.get_mut(depth - 1) {
                        frame.current = previous;
                    }
                    result
                }
                None => {
                    // Chain exhausted: continue in the enclosing one.
                    let exhausted = self.frames.pop();
                    let result = self.next().await;
                    self.frames.extend(exhausted);
                    result
                }
            }
        })
    }

    async fn run_fallback(&mut self) -> HandlerResult {
        if self.fallback_used {
            tracing::error!("next() called multiple times past the end of the chain");
            return Err(HandlerError::NextCalledTwice);
        }
        self.fallback_used = true;
        let fallback = Arc::clone(&self.fallback);
        fallback.call(self).await
    }
}
