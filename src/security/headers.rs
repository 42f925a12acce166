//! Header sanitizing for forwarded requests.
//!
//! # Responsibilities
//! - Strip headers that identify the caller or the edge platform
//! - Strip hop-by-hop headers owned by the outbound client
//! - Merge the caller-supplied `x-cors-headers` overlay on top
//!
//! # Design Decisions
//! - Exclusion is prefix/substring based (`^origin`, `eferer`, `^cf-`,
//!   `^x-forw`), so e.g. a `dereferer` header is stripped as well
//! - The overlay is applied after stripping and always wins, even when it
//!   names an excluded header
//! - A malformed overlay is never an error; it is treated as empty

use std::collections::BTreeMap;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

/// Request header carrying the JSON overlay.
pub const CORS_HEADERS_OVERLAY: &str = "x-cors-headers";

/// Headers describing the caller↔relay hop. The outbound client sets its own.
const HOP_BY_HOP: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "te",
    "trailer",
    "proxy-connection",
];

/// Returns true if an inbound header must not reach the target.
///
/// `name` is compared case-insensitively.
pub fn is_excluded(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("origin")
        || name.contains("eferer")
        || name.starts_with("cf-")
        || name.starts_with("x-forw")
        || name == CORS_HEADERS_OVERLAY
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Caller-supplied header overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverlay {
    entries: BTreeMap<String, String>,
}

impl HeaderOverlay {
    /// Parse overlay JSON text.
    ///
    /// Anything other than a JSON object of string values yields an empty
    /// overlay.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<BTreeMap<String, String>>(raw) {
            Ok(entries) => Self { entries },
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed x-cors-headers overlay");
                Self::default()
            }
        }
    }

    /// Read the overlay from request headers. `None` when the caller sent none.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(CORS_HEADERS_OVERLAY)
            .map(|v| Self::parse(&String::from_utf8_lossy(v.as_bytes())))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// JSON text of the entries, for display.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Build the header map sent to the target.
///
/// Repeated inbound headers collapse to their last value.
pub fn sanitize_headers(inbound: &HeaderMap, overlay: Option<&HeaderOverlay>) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(inbound.keys_len());

    for (name, value) in inbound {
        let key = name.as_str();
        if is_excluded(key) || is_hop_by_hop(key) {
            continue;
        }
        forwarded.insert(name.clone(), value.clone());
    }

    if let Some(overlay) = overlay {
        for (name, value) in overlay.iter() {
            let parsed = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            );
            match parsed {
                (Ok(name), Ok(value)) => {
                    forwarded.insert(name, value);
                }
                _ => {
                    tracing::debug!(header = %name, "Skipping overlay entry that is not a valid header");
                }
            }
        }
    }

    forwarded
}
