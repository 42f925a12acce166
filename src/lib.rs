//! CORS relay library.
//!
//! Forwards a request to the URL given in the query string and rewrites the
//! response so browser code on any origin may read it.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::RelayConfig;
pub use error::{RelayError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
