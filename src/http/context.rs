//! Per-request context.
//!
//! # Responsibilities
//! - Carry the parsed URL, the request, extracted params and request state
//! - Hold the chain cursor used by `next()` (see `middleware::compose`)
//! - Build sanitized redirects
//!
//! # Design Decisions
//! - One context per request, owned by that request's task
//! - The URL is absolute: scheme `http`, host from the Host header, path
//!   with duplicate slashes collapsed
//! - `state` starts as `S::default()`; its shape is a contract between the
//!   middleware of one application

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use url::Url;

use crate::error::HandlerError;
use crate::middleware::compose::Frame;
use crate::middleware::{Handler, HandlerResult};
use crate::routing::collapse_slashes;

const DEFAULT_HOST: &str = "localhost";

/// The mutable carrier threaded through a request's middleware chain.
pub struct Context<S> {
    /// Absolute request URL with a normalized path.
    pub url: Url,
    /// The inbound request.
    pub request: Request,
    /// Request-scoped state shared by the chain.
    pub state: S,
    /// Path parameters extracted by the router, percent-decoded.
    pub params: HashMap<String, String>,
    /// The error being handled, set while an error route runs.
    pub error: Option<HandlerError>,
    pub(crate) frames: Vec<Frame<S>>,
    pub(crate) fallback: Handler<S>,
    pub(crate) fallback_used: bool,
}

impl<S: Default> Context<S> {
    /// Create the context for `request`.
    ///
    /// `fallback` is what `next()` runs once every chain is exhausted.
    pub fn new(request: Request, fallback: Handler<S>) -> Result<Self, HandlerError> {
        let url = request_url(&request)?;
        Ok(Self {
            url,
            request,
            state: S::default(),
            params: HashMap::new(),
            error: None,
            frames: Vec::new(),
            fallback,
            fallback_used: false,
        })
    }
}

impl<S> Context<S> {
    /// A path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Redirect to `target` with `302 Found`.
    pub fn redirect(&self, target: &str) -> HandlerResult {
        redirect(target, StatusCode::FOUND)
    }

    /// Redirect to `target` with the given status.
    pub fn redirect_with_status(&self, target: &str, status: StatusCode) -> HandlerResult {
        redirect(target, status)
    }

    /// Drop any chain state and install a new fallback, keeping the request,
    /// state and params. Used before running an error route.
    pub(crate) fn restart(&mut self, fallback: Handler<S>) {
        self.frames.clear();
        self.fallback = fallback;
        self.fallback_used = false;
    }
}

/// Build an empty-bodied redirect response.
///
/// Targets that are paths (start with `/` but are not exactly `/`) have
/// their path portion slash-collapsed so `//evil.com` cannot become a
/// protocol-relative URL; query and fragment are kept as given.
pub fn redirect(target: &str, status: StatusCode) -> HandlerResult {
    let location = sanitize_location(target);
    let value = HeaderValue::from_str(&location)
        .map_err(|_| HandlerError::InvalidRedirect(target.to_string()))?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, value);
    Ok(response)
}

fn sanitize_location(target: &str) -> String {
    if !target.starts_with('/') || target == "/" {
        return target.to_string();
    }
    let split = target.find(['?', '#']).unwrap_or(target.len());
    let (path, rest) = target.split_at(split);
    format!("{}{}", collapse_slashes(path), rest)
}

/// Absolute URL of `request` with duplicate slashes collapsed.
pub fn request_url(request: &Request) -> Result<Url, HandlerError> {
    let uri = request.uri();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.contains(['/', '?', '#', '@', '\\']))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or(DEFAULT_HOST);

    let path = collapse_slashes(uri.path());
    let suffix = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.into_owned(),
    };

    match Url::parse(&format!("http://{host}{suffix}")) {
        Ok(url) => Ok(url),
        Err(error) => {
            tracing::debug!(host = %host, error = %error, "Unusable Host header, using default host");
            Ok(Url::parse(&format!("http://{DEFAULT_HOST}{suffix}"))?)
        }
    }
}
