//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use stackroute::AppHandler;

/// Build an empty-bodied request.
pub fn request(method: Method, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request through the handler.
pub async fn send<S: Default + Send + 'static>(
    handler: &AppHandler<S>,
    method: Method,
    uri: &str,
) -> Response {
    handler.call(request(method, uri)).await
}

/// Read a whole response body as UTF-8.
pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Send a request and return its status and body.
pub async fn fetch<S: Default + Send + 'static>(
    handler: &AppHandler<S>,
    method: Method,
    uri: &str,
) -> (StatusCode, String) {
    let response = send(handler, method, uri).await;
    let status = response.status();
    (status, body_string(response).await)
}

/// State used by ordering tests: middleware append to `text`.
#[derive(Default)]
pub struct TextState {
    pub text: String,
}
