//! Route-result cache.
//!
//! Memoizes the outcome of matching `(method, pathname)` so repeat requests
//! skip the router scan and chain composition.

use axum::http::Method;
use dashmap::DashMap;

/// A thread-safe, size-capped cache of match results.
pub struct RouteCache<V> {
    /// (method, collapsed pathname) → cached match outcome.
    inner: DashMap<(Method, String), V>,
    capacity: usize,
}

impl<V: Clone> RouteCache<V> {
    /// A cache holding at most `capacity` entries. 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: DashMap::new(),
            capacity,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        self.inner
            .get(&(method.clone(), path.to_string()))
            .map(|r| r.value().clone())
    }

    /// Store a result, evicting an arbitrary entry when full.
    ///
    /// Results are deterministic for a fixed route table, so concurrent
    /// inserts for one key store equivalent values and the last one wins.
    pub fn insert(&self, method: Method, path: String, value: V) {
        if !self.is_enabled() {
            return;
        }
        let key = (method, path);
        if self.inner.len() >= self.capacity && !self.inner.contains_key(&key) {
            let victim = self.inner.iter().next().map(|r| r.key().clone());
            if let Some(victim) = victim {
                self.inner.remove(&victim);
                tracing::trace!(method = %victim.0, path = %victim.1, "Route cache evicted entry");
            }
        }
        self.inner.insert(key, value);
    }
}
