//! Relay access policy.
//!
//! A request is relayed only when its target URL is not blacklisted and its
//! Origin is whitelisted. A request without an Origin header (curl, server
//! side callers, same-origin navigations) is always treated as whitelisted.

use crate::config::PolicyConfig;
use crate::security::patterns::PatternSet;

/// Decides whether a (target, origin) pair may be relayed.
#[derive(Debug, Clone, Default)]
pub struct PolicyFilter {
    blacklist: PatternSet,
    whitelist: PatternSet,
}

impl PolicyFilter {
    pub fn new(blacklist: PatternSet, whitelist: PatternSet) -> Self {
        Self { blacklist, whitelist }
    }

    /// Compile both pattern lists from configuration.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, regex::Error> {
        Ok(Self::new(
            PatternSet::new(&config.blacklist_urls)?,
            PatternSet::new(&config.whitelist_origins)?,
        ))
    }

    pub fn is_blacklisted(&self, target_url: &str) -> bool {
        self.blacklist.is_listed(target_url)
    }

    pub fn is_whitelisted(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(origin) => self.whitelist.is_listed(origin),
            None => true,
        }
    }

    pub fn permitted(&self, target_url: &str, origin: Option<&str>) -> bool {
        !self.is_blacklisted(target_url) && self.is_whitelisted(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(blacklist: &[&str], whitelist: &[&str]) -> PolicyFilter {
        PolicyFilter::new(
            PatternSet::new(blacklist).unwrap(),
            PatternSet::new(whitelist).unwrap(),
        )
    }

    #[test]
    fn test_default_config_permits_everything() {
        let f = PolicyFilter::from_config(&PolicyConfig::default()).unwrap();
        assert!(f.permitted("https://example.com", Some("https://app.test")));
        assert!(f.permitted("https://example.com", None));
        assert!(f.permitted("", Some("null")));
    }

    #[test]
    fn test_blacklisted_target_rejected_for_any_origin() {
        let f = filter(&["internal\\.corp"], &[".*"]);
        for origin in [None, Some("https://app.test"), Some("")] {
            assert!(!f.permitted("http://db.internal.corp/admin", origin));
        }
        assert!(f.permitted("http://public.test/", Some("https://app.test")));
    }

    #[test]
    fn test_unlisted_origin_rejected_for_any_target() {
        let f = filter(&[], &["^https://app\\.test$"]);
        assert!(!f.permitted("https://example.com", Some("https://other.test")));
        assert!(!f.permitted("", Some("https://other.test")));
        assert!(f.permitted("https://example.com", Some("https://app.test")));
    }

    #[test]
    fn test_absent_origin_whitelisted_even_with_empty_whitelist() {
        let f = filter(&[], &[]);
        assert!(f.is_whitelisted(None));
        assert!(!f.is_whitelisted(Some("https://app.test")));
        assert!(f.permitted("https://example.com", None));
    }

    #[test]
    fn test_empty_blacklist_lists_nothing() {
        let f = filter(&[], &[".*"]);
        assert!(!f.is_blacklisted(""));
        assert!(!f.is_blacklisted("https://anything.test"));
    }
}
