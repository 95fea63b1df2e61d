//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed server stops accepting → in-flight
//!     requests finish → Server::run returns
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator per process, handed to each server
//! - Servers own their drain; the coordinator only announces

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
