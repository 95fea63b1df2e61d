//! HTTP layer subsystem.
//!
//! # Data Flow
//! ```text
//! TcpListener (from net)
//!     → server.rs (axum serve loop, TraceLayer)
//!     → AppHandler::call(Request)
//!         → context.rs (Context: url, request, state, params, next)
//!         → middleware chain
//!         → response.rs (fallback bodies, HEAD stripping)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Request and response types are axum's (`http` 1.x, `axum::body::Body`)
//! - The server layer knows nothing about routing

pub mod context;
pub mod response;
pub mod server;

pub use context::{redirect, request_url, Context};
pub use response::{
    internal_error, json, method_not_allowed, not_found, status_text, strip_body, text,
    INTERNAL_ERROR_BODY, METHOD_NOT_ALLOWED_BODY, NOT_FOUND_BODY,
};
pub use server::Server;
