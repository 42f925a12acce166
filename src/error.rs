//! Relay error taxonomy.
//!
//! Every variant maps to a plain-text response; none of them is fatal to the
//! process.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::forwarder::ForwardError;

/// Body of every policy rejection.
pub const FORBIDDEN_BODY: &str =
    "Access Forbidden\n\nThis relay does not serve the requested origin or target.\n";

/// Errors surfaced to a relay caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Target blacklisted or origin not whitelisted.
    #[error("access forbidden")]
    PolicyRejected,

    /// The inbound body could not be read (too large or aborted).
    #[error("request body rejected: {0}")]
    RequestBody(#[source] axum::Error),

    /// Contacting or reading from the target failed.
    #[error(transparent)]
    Forwarding(#[from] ForwardError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::PolicyRejected => StatusCode::FORBIDDEN,
            RelayError::RequestBody(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Forwarding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            RelayError::PolicyRejected => FORBIDDEN_BODY.to_string(),
            other => format!("Error: {}\n", error_chain(other)),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.body()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        response
    }
}

/// Render an error and its sources as one line.
///
/// reqwest keeps the useful part ("connection refused", "dns error") in the
/// source chain, not in the top-level message.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

/// Errors that prevent the relay from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("invalid policy pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
