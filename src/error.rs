//! Errors raised while dispatching a request.
//!
//! Every variant is recovered at the application boundary and turned into a
//! response; none of them escape `AppHandler::call`.

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed error type accepted from application code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error that carries the HTTP status it should be answered with.
///
/// Returning `HttpError::not_found()` from a handler is the typed not-found
/// signal: it is routed to the application's `not_found` override.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// Failure of a middleware chain.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A status-carrying error raised by application code.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// `next()` was invoked twice within one middleware turn.
    #[error("next() called multiple times within the same middleware")]
    NextCalledTwice,

    /// A handler finished without producing a response.
    #[error("handler produced no response")]
    NoResponse,

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The request URL could not be parsed.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A redirect target is not a valid `Location` header value.
    #[error("invalid redirect target `{0}`")]
    InvalidRedirect(String),

    /// Any other application error.
    #[error(transparent)]
    Other(BoxError),
}

impl HandlerError {
    /// Wrap an arbitrary application error.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        HandlerError::Other(error.into())
    }

    /// Returns true for the typed not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HandlerError::Http(e) if e.is_not_found())
    }

    /// Status code used when no error route handles this error.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Http(e) => e.status,
            HandlerError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
