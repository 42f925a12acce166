//! CORS response rewriting.
//!
//! # Responsibilities
//! - Add the allow-origin / allow-credentials pair to every answer
//! - Answer preflight requests without contacting the target
//! - Expose every upstream header to browser script, and mirror them as JSON
//!   under `cors-received-headers`
//!
//! # Design Decisions
//! - Allow-Origin echoes the caller's Origin, `*` when there is none
//! - Framing headers of the upstream hop are not copied onto the relayed
//!   response (the body is re-framed), but they stay in the mirror. A HEAD
//!   answer keeps the upstream `content-length`, since it has no body to
//!   re-frame
//! - A non-canonical upstream reason phrase is carried to the status line
//! - Repeated upstream headers are joined with ", " in the mirror

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::Response;

use crate::http::forwarder::UpstreamResponse;

/// Diagnostic header mirroring the upstream headers.
pub const CORS_RECEIVED_HEADERS: &str = "cors-received-headers";

/// Methods advertised on preflight answers.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";

const REFRAMED: &[&str] = &["transfer-encoding", "connection"];

/// Set the CORS headers every relay response carries.
pub fn apply_cors(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    let allow_origin = origin
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

/// Add the preflight-only headers.
pub fn apply_preflight(headers: &mut HeaderMap, request: &HeaderMap, max_age_secs: Option<u64>) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Some(requested) = request.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }
    if let Some(secs) = max_age_secs {
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(secs));
    }
    headers.remove(X_CONTENT_TYPE_OPTIONS);
}

/// Answer a preflight request: 200, no body.
pub fn preflight_response(request: &HeaderMap, max_age_secs: Option<u64>) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    apply_cors(headers, request.get(header::ORIGIN));
    apply_preflight(headers, request, max_age_secs);
    response
}

/// JSON object of every upstream header name → value.
pub fn mirror_headers(upstream: &HeaderMap) -> String {
    let mut mirror: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in upstream {
        let value = String::from_utf8_lossy(value.as_bytes());
        match mirror.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                mirror.insert(name.as_str(), value.into_owned());
            }
        }
    }
    serde_json::to_string(&mirror).unwrap_or_else(|_| "{}".to_string())
}

/// Comma-joined upstream header names plus the mirror header.
pub fn expose_list(upstream: &HeaderMap) -> String {
    let mut names: Vec<&str> = upstream.keys().map(HeaderName::as_str).collect();
    names.push(CORS_RECEIVED_HEADERS);
    names.join(",")
}

/// Turn a buffered upstream response into the caller's response.
pub fn relay_response(
    upstream: UpstreamResponse,
    method: &Method,
    origin: Option<&HeaderValue>,
) -> Response {
    let UpstreamResponse {
        status,
        reason,
        headers: upstream_headers,
        body,
    } = upstream;

    let mut headers = upstream_headers.clone();
    for name in REFRAMED {
        headers.remove(*name);
    }
    if *method != Method::HEAD {
        headers.remove(header::CONTENT_LENGTH);
    }
    apply_cors(&mut headers, origin);

    if let Ok(expose) = HeaderValue::from_str(&expose_list(&upstream_headers)) {
        headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, expose);
    }
    match HeaderValue::from_str(&mirror_headers(&upstream_headers)) {
        Ok(mirror) => {
            headers.insert(HeaderName::from_static(CORS_RECEIVED_HEADERS), mirror);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Upstream headers cannot be mirrored into a header value");
        }
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(reason) = reason {
        response.extensions_mut().insert(reason);
    }
    response
}
