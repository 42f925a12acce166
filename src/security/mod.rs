//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (target blacklist, origin whitelist)
//!     → headers.rs (strip identifying headers, merge caller overlay)
//!     → Pass to forwarder
//! ```
//!
//! # Design Decisions
//! - Pattern sets are compiled once and shared read-only
//! - Matching is unanchored search, so a pattern lists any string containing it
//! - Policy rejection is a plain 403, never a partial relay

pub mod access_control;
pub mod headers;
pub mod patterns;

pub use access_control::PolicyFilter;
pub use headers::{sanitize_headers, HeaderOverlay, CORS_HEADERS_OVERLAY};
pub use patterns::PatternSet;
