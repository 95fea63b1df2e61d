//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (route registration, cache, dispatch, binding)
//!     → `request` spans carrying a UUID request_id
//!
//! logging.rs installs the subscriber:
//!     → stdout, pretty or JSON
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated messages
//! - JSON output for machine parsing, pretty output for development
//! - `RUST_LOG` wins over the configured level

pub mod logging;

pub use logging::init_logging;
