//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenOptions { hostname, port, mode }
//!     → listener.rs (bind, probing sequential ports in development)
//!     → tokio TcpListener
//!     → http::server (axum serve loop)
//! ```
//!
//! # Design Decisions
//! - Port probing is bounded and only retries on "address in use"
//! - The first bind error is the one reported
//! - Production binds exactly the configured port

pub mod listener;

pub use listener::{bind, bind_with_probe, ListenOptions, ListenerError};
