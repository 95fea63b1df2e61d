//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (App::get/post/use/route/mount_app):
//!     path string
//!     → paths.rs (merge with base path / mount prefix)
//!     → pattern.rs (compile if it holds placeholders)
//!     → router.rs (append RouteEntry)
//!
//! Request:
//!     (method, collapsed pathname)
//!     → router.rs (scan all entries in order)
//!     → MatchResult { params, handlers, path_matched, method_matched }
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable while serving
//! - Registration order is evaluation order; all matches are collected
//! - Exact strings and the literal `*` are never compiled

pub mod paths;
pub mod pattern;
pub mod router;

pub use paths::{collapse_slashes, merge_paths};
pub use pattern::{is_pattern, CompiledPattern, PatternError};
pub use router::{EntryKind, MatchResult, RouteEntry, RouteMethod, RoutePath, Router};
