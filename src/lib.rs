//! Request routing and onion-model middleware dispatch for tokio/axum
//! servers.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server ──▶ app::AppHandler
//!                                                            │
//!                                       ┌────────────────────┤
//!                                       ▼                    ▼
//!                                  app::cache  ◀──miss── routing::router
//!                                       │                    │
//!                                       ▼                    ▼
//!                                 middleware::compose ◀── matched handlers
//!                                       │
//!                                       ▼
//!                             A → B → C (ctx.next()) → 404/405 fallback
//!                                       │
//!     Client Response                   ▼
//!     ◀────────────── HEAD strip ◀── error recovery (not_found / on_error / 500)
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stackroute::{App, ListenOptions, Shutdown, text};
//!
//! #[derive(Default)]
//! struct State {
//!     user: Option<String>,
//! }
//!
//! # async fn run() -> Result<(), stackroute::ServeError> {
//! let mut app: App<State> = App::with_base_path("/api");
//! app.use_middleware(|ctx| {
//!     Box::pin(async move {
//!         ctx.state.user = Some("guest".to_string());
//!         ctx.next().await
//!     })
//! })
//! .get("/users/:id", |ctx| {
//!     Box::pin(async move {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         Ok(text(format!("user {id}")))
//!     })
//! });
//!
//! let shutdown = Shutdown::new();
//! app.listen(&ListenOptions::new("127.0.0.1", 8000), shutdown.subscribe()).await
//! # }
//! ```

// Core
pub mod app;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routing;

// Serving
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use app::{App, AppHandler, BuildError, MethodHandlers, RouteDefinition, ServeError};
pub use config::{Mode, ServerConfig};
pub use error::{BoxError, HandlerError, HttpError};
pub use http::{json, redirect, status_text, text, Context, Server};
pub use lifecycle::Shutdown;
pub use middleware::{compose, handler_fn, BoxFuture, Handler, HandlerResult, Middleware};
pub use net::ListenOptions;
pub use routing::{merge_paths, RouteMethod};
