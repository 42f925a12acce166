//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Compile every policy pattern so bad regexes fail at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("{field}[{index}]: invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        field: &'static str,
        index: usize,
        pattern: String,
        reason: String,
    },

    #[error("info.connecting_ip_header: {0:?} is not a valid header name")]
    InvalidHeaderName(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.request_secs" });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "limits.max_body_bytes" });
    }

    check_patterns("policy.blacklist_urls", &config.policy.blacklist_urls, &mut errors);
    check_patterns("policy.whitelist_origins", &config.policy.whitelist_origins, &mut errors);

    if axum::http::HeaderName::from_bytes(config.info.connecting_ip_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.info.connecting_ip_header.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_patterns(field: &'static str, patterns: &[String], errors: &mut Vec<ValidationError>) {
    for (index, pattern) in patterns.iter().enumerate() {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ValidationError::InvalidPattern {
                field,
                index,
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
    }
}
