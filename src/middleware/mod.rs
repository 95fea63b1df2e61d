//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! matched handlers [A, B, C]
//!     → compose.rs (one Chain, or the single handler as-is)
//!     → Chain::call(ctx)
//!         A before → ctx.next() → B before → ctx.next() → C → response
//!         ← B after ← A after
//!     → past C: the enclosing chain, then the context fallback
//! ```
//!
//! # Design Decisions
//! - Middleware are `Arc`-shared async functions over `&mut Context<S>`
//! - One `next()` per middleware turn; a second call is an error
//! - Errors propagate as `Err`, so an outer middleware sees them as the
//!   result of its own `next()`

pub mod compose;
pub mod handler;

pub use compose::{compose, Chain};
pub use handler::{handler_fn, BoxFuture, Handler, HandlerResult, Middleware};
