//! Application subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     App::get/post/use_middleware/route/mount_app/on_error
//!     → routing::Router (endpoints + middleware), error router
//!     → App::handler() → AppHandler (immutable snapshot + cache)
//!
//! Request (AppHandler::call):
//!     Received
//!     → cache.rs lookup {hit → invoke, miss → match}
//!     → match {no path → 404, path but no method → 405, matched → compose}
//!     → invoke {Ok → respond, Err/panic → not_found | on_error | default}
//!     → HEAD? strip body
//! ```
//!
//! # Design Decisions
//! - Global middleware wraps the 404/405 fallbacks too
//! - Mounting flattens the inner tables into the outer ones with rebased
//!   paths; order is preserved, so the onion nesting survives
//! - The cache key includes the method

pub mod application;
pub mod cache;
pub mod definition;

pub use application::{App, AppHandler};
pub use cache::RouteCache;
pub use definition::{MethodHandlers, RouteDefinition};

use thiserror::Error;

use crate::net::ListenerError;
use crate::routing::PatternError;

/// Routes that could not be compiled, reported by `App::handler()`.
#[derive(Debug, Clone, Error)]
#[error("{} route(s) failed to compile: {}", .errors.len(), summarize(.errors))]
pub struct BuildError {
    pub errors: Vec<PatternError>,
}

fn summarize(errors: &[PatternError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure to start or run a server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
