//! Outbound request forwarding.
//!
//! # Responsibilities
//! - Issue the sanitized request to the target URL
//! - Follow redirects so the caller only sees the final response
//! - Buffer the full upstream response for header rewriting
//!
//! # Design Decisions
//! - One attempt per request; failures become a 500, never a retry
//! - Every outbound call has a deadline (request + connect timeouts)
//! - GET and HEAD never carry a body, whatever the caller sent

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use hyper::ext::ReasonPhrase;
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;

/// Maximum redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Failure while contacting or reading from the target.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid target URL {url:?}: {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("failed to read upstream response: {0}")]
    Body(#[source] reqwest::Error),
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Set only when the upstream sent a non-canonical reason phrase.
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Shared outbound client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build the outbound client from timeout configuration.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Forward one request and buffer the response.
    pub async fn forward(
        &self,
        method: Method,
        target: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, ForwardError> {
        let url = parse_target(target)?;
        tracing::debug!(method = %method, target = %url, "Forwarding request");

        let carries_body = method != Method::GET && method != Method::HEAD;
        let mut builder = self.client.request(method, url).headers(headers);
        if carries_body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(ForwardError::Upstream)?;
        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(ForwardError::Body)?;

        Ok(UpstreamResponse {
            status,
            reason,
            headers,
            body,
        })
    }
}

/// Parse a target, accepting only http(s) URLs.
pub fn parse_target(target: &str) -> Result<Url, ForwardError> {
    let url = Url::parse(target).map_err(|e| ForwardError::InvalidTarget {
        url: target.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ForwardError::InvalidTarget {
            url: target.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}
