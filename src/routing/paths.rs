//! Path string helpers shared by registration and dispatch.
//!
//! # Responsibilities
//! - Join base paths, mount prefixes and route paths
//! - Collapse runs of slashes in request paths and redirect targets
//!
//! # Design Decisions
//! - Joining never produces `//` at a seam and never drops a separator
//! - Results always start with `/`
//! - A trailing slash on the right-hand fragment is kept (`/users/` != `/users`)

use std::borrow::Cow;

/// Join two path fragments with exactly one slash between them.
///
/// Empty and `/` fragments are neutral:
///
/// ```
/// use stackroute::routing::merge_paths;
///
/// assert_eq!(merge_paths("/foo/bar", "/"), "/foo/bar");
/// assert_eq!(merge_paths("/main/", "/v1"), "/main/v1");
/// assert_eq!(merge_paths("", "users"), "/users");
/// assert_eq!(merge_paths("", ""), "/");
/// ```
pub fn merge_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let mut merged = String::with_capacity(base.len() + path.len() + 2);
    if !base.is_empty() {
        if !base.starts_with('/') {
            merged.push('/');
        }
        merged.push_str(base);
    }
    merged.push('/');
    merged.push_str(path);

    if merged.len() > 1 && path.is_empty() {
        merged.pop();
    }
    merged
}

/// Replace every run of consecutive slashes with a single slash.
pub fn collapse_slashes(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        collapsed.push(c);
    }
    Cow::Owned(collapsed)
}
