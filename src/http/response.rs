//! Response construction.
//!
//! # Responsibilities
//! - Terminal responses for not-found, method-mismatch and handler failure
//! - Plain-text and JSON helpers for handlers
//! - Body removal for HEAD responses
//!
//! # Design Decisions
//! - Fallback bodies are fixed strings; compatibility tests compare them
//!   byte for byte
//! - HEAD responses keep status and headers, lose the body

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body of the default 404 response.
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Body of the 405 response.
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";

/// Body of the default 500 response.
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

/// `200 OK` with a plain-text body.
pub fn text(body: impl Into<String>) -> Response {
    status_text(StatusCode::OK, body)
}

/// Plain-text response with an explicit status.
pub fn status_text(status: StatusCode, body: impl Into<String>) -> Response {
    (status, body.into()).into_response()
}

/// `200 OK` with a JSON body.
pub fn json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(error = %error, "Failed to serialize JSON response");
            internal_error()
        }
    }
}

pub fn not_found() -> Response {
    status_text(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

pub fn method_not_allowed() -> Response {
    status_text(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY)
}

pub fn internal_error() -> Response {
    status_text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
}

/// Replace the body with an empty one, keeping status and headers.
pub fn strip_body(response: Response) -> Response {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Body::empty())
}
