//! Request inspection.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract the target URL from the raw query string
//! - Read the caller identity the edge platform attached (IP, country, colo)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The target is everything after the first `?`, percent-decoded twice so
//!   singly and doubly encoded targets both work
//! - Edge metadata is optional; a bare deployment falls back to the TCP peer

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderValue, Request, Uri};
use percent_encoding::percent_decode_str;
use tower_http::request_id::{MakeRequestId, RequestId};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayRequestId;

impl MakeRequestId for RelayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID of an inbound request, or "unknown".
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// The URL the caller wants relayed, if any.
///
/// `/?https%3A%2F%2Fexample.com%2Fapi` and `/?https://example.com/api` both
/// yield `https://example.com/api`. An empty query means no target.
pub fn target_url(uri: &Uri) -> Option<String> {
    let raw = uri.query().filter(|q| !q.is_empty())?;
    let once = percent_decode_str(raw).decode_utf8_lossy();
    let twice = percent_decode_str(&once).decode_utf8_lossy().into_owned();
    Some(twice)
}

/// Header value as text, lossily decoded.
pub fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Metadata describing who is calling, for the informational page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerInfo {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub datacenter: Option<String>,
}

impl CallerInfo {
    /// Collect caller metadata from edge headers and the connection.
    pub fn from_request<B>(request: &Request<B>, connecting_ip_header: &str) -> Self {
        let headers = request.headers();
        let ip = header_text(headers, connecting_ip_header).or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        let country = header_text(headers, "cf-ipcountry").filter(|c| !c.is_empty());
        // cf-ray looks like "8a1b2c3d4e5f6789-SJC"; the suffix is the colo.
        let datacenter = header_text(headers, "cf-ray")
            .and_then(|ray| ray.rsplit_once('-').map(|(_, colo)| colo.to_string()))
            .filter(|c| !c.is_empty());

        Self {
            ip,
            country,
            datacenter,
        }
    }
}

/// Origin of the relay itself as the caller addressed it.
pub fn own_origin(headers: &HeaderMap) -> String {
    let host = header_text(headers, "host").unwrap_or_else(|| "localhost".to_string());
    let scheme = header_text(headers, "x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    format!("{}://{}", scheme, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_target_url_plain() {
        let uri: Uri = "/?https://example.com/api".parse().unwrap();
        assert_eq!(target_url(&uri).as_deref(), Some("https://example.com/api"));
    }

    #[test]
    fn test_target_url_keeps_inner_query() {
        let uri: Uri = "/?https://example.com/search?q=rust&page=2".parse().unwrap();
        assert_eq!(
            target_url(&uri).as_deref(),
            Some("https://example.com/search?q=rust&page=2")
        );
    }

    #[test]
    fn test_target_url_encoded_once_and_twice() {
        let once: Uri = "/?https%3A%2F%2Fexample.com%2Fa%20b".parse().unwrap();
        assert_eq!(target_url(&once).as_deref(), Some("https://example.com/a b"));

        let twice: Uri = "/?https%253A%252F%252Fexample.com%252Fx".parse().unwrap();
        assert_eq!(target_url(&twice).as_deref(), Some("https://example.com/x"));
    }

    #[test]
    fn test_no_target() {
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(target_url(&uri), None);
        let uri: Uri = "/?".parse().unwrap();
        assert_eq!(target_url(&uri), None);
    }

    #[test]
    fn test_caller_info_from_edge_headers() {
        let req = Request::builder()
            .header("cf-connecting-ip", "203.0.113.7")
            .header("cf-ipcountry", "NL")
            .header("cf-ray", "8a1b2c3d4e5f6789-AMS")
            .body(Body::empty())
            .unwrap();
        let info = CallerInfo::from_request(&req, "cf-connecting-ip");
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.country.as_deref(), Some("NL"));
        assert_eq!(info.datacenter.as_deref(), Some("AMS"));
    }

    #[test]
    fn test_caller_info_falls_back_to_peer() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "198.51.100.1:4000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        let info = CallerInfo::from_request(&req, "cf-connecting-ip");
        assert_eq!(info.ip.as_deref(), Some("198.51.100.1"));
        assert_eq!(info.country, None);
        assert_eq!(info.datacenter, None);
    }

    #[test]
    fn test_own_origin() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("relay.test:8080"));
        assert_eq!(own_origin(&headers), "http://relay.test:8080");
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(own_origin(&headers), "https://relay.test:8080");
    }
}
