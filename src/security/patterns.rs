//! Regular-expression pattern sets.
//!
//! A candidate is "listed" when any pattern finds a match anywhere in it.
//! Patterns are not anchored: `example\.com` lists `https://example.com.evil/`
//! too. Callers wanting exact matches must write `^...$` themselves.

use regex::RegexSet;

/// An ordered, compiled set of patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: RegexSet,
}

impl PatternSet {
    /// Compile the given patterns. Fails on the first invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    /// A set that lists nothing.
    pub fn empty() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    /// Returns true if any pattern matches somewhere in `candidate`.
    pub fn is_listed(&self, candidate: &str) -> bool {
        self.set.is_match(candidate)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// The source patterns, in configuration order.
    pub fn patterns(&self) -> &[String] {
        self.set.patterns()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}
