//! Compiled pattern memoization.
//!
//! Patterns are keyed by their source text plus flags. Every pattern the
//! mirror builds derives from the domain table or a fixed literal, so the key
//! space is finite and entries are never evicted.
//!
//! Concurrent misses on the same key may both compile; the first insert wins
//! and the loser's regex is dropped. Both are equivalent.

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};

/// Compile-time switches that are part of a pattern's identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PatternFlags {
    pub case_insensitive: bool,
}

impl PatternFlags {
    pub const NONE: Self = Self {
        case_insensitive: false,
    };

    pub const CASE_INSENSITIVE: Self = Self {
        case_insensitive: true,
    };
}

/// A thread-safe cache of compiled regexes.
#[derive(Debug, Default)]
pub struct RegexCache {
    patterns: DashMap<(String, PatternFlags), Regex>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the compiled form of `pattern`, compiling it on first use.
    pub fn get(&self, pattern: &str, flags: PatternFlags) -> Result<Regex, regex::Error> {
        let key = (pattern.to_string(), flags);
        if let Some(regex) = self.patterns.get(&key) {
            return Ok(regex.value().clone());
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.case_insensitive)
            .build()?;
        tracing::trace!(pattern = %pattern, "Compiled rewrite pattern");

        Ok(self.patterns.entry(key).or_insert(regex).value().clone())
    }

    /// Number of distinct compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_same_key_compiles_once() {
        let cache = RegexCache::new();
        let a = cache.get(r"gh\.", PatternFlags::NONE).unwrap();
        let b = cache.get(r"gh\.", PatternFlags::NONE).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_flags_are_part_of_the_key() {
        let cache = RegexCache::new();
        let exact = cache.get("https", PatternFlags::NONE).unwrap();
        let folded = cache.get("https", PatternFlags::CASE_INSENSITIVE).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!exact.is_match("HTTPS"));
        assert!(folded.is_match("HTTPS"));
    }

    #[test]
    fn test_invalid_pattern_is_not_cached() {
        let cache = RegexCache::new();
        assert!(cache.get("(unclosed", PatternFlags::NONE).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(RegexCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let pattern = format!("origin-{}", i % 2);
                    cache.get(&pattern, PatternFlags::NONE).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 2);
    }
}
