//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, relay handler)
//!     → request.rs (request ID, target URL, caller metadata)
//!     → [security: policy filter, header sanitizer]
//!     → info.rs (no target) | response.rs preflight (OPTIONS)
//!     → forwarder.rs (outbound request, buffered response)
//!     → response.rs (CORS rewrite, header mirror)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod info;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardError, Forwarder, UpstreamResponse};
pub use request::{RelayRequestId, X_REQUEST_ID};
pub use response::CORS_RECEIVED_HEADERS;
pub use server::{AppState, HttpServer};
