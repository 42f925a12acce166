//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the CORS relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Target blacklist and origin whitelist.
    pub policy: PolicyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body limits and the advertised request quotas.
    pub limits: LimitsConfig,

    /// Preflight tuning.
    pub cors: CorsConfig,

    /// Informational page settings.
    pub info: InfoConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Pattern lists deciding which requests may be relayed.
///
/// Patterns are regular expressions searched anywhere in the candidate
/// string, so `example\.com` also lists `https://api.example.com/x`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Target URLs matching any of these are refused.
    pub blacklist_urls: Vec<String>,

    /// Origins must match one of these. An absent Origin is always allowed.
    pub whitelist_origins: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            blacklist_urls: Vec::new(),
            whitelist_origins: vec![".*".to_string()],
        }
    }
}

/// Timeout configuration for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits and the quota text shown on the info page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Quota lines shown to callers. Nothing enforces them here; an edge
    /// platform in front of the relay is expected to.
    pub advertised: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            advertised: vec![
                "100,000 requests/day".to_string(),
                "1,000 requests/10 minutes".to_string(),
            ],
        }
    }
}

/// CORS tuning.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// `Access-Control-Max-Age` sent on preflight answers, if set.
    pub preflight_max_age_secs: Option<u64>,
}

/// Informational page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InfoConfig {
    /// First line of the page.
    pub banner: String,

    /// Where the relay's source can be found.
    pub source_url: String,

    /// Header carrying the caller IP as seen by the edge platform.
    pub connecting_ip_header: String,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            banner: "CLOUDFLARE-CORS-ANYWHERE".to_string(),
            source_url: "https://github.com/Zibri/cloudflare-cors-anywhere".to_string(),
            connecting_ip_header: "cf-connecting-ip".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
