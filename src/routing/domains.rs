//! The origin ↔ proxy-prefix table.
//!
//! # Design Decisions
//! - Ordered list, not a map: host resolution is first-match and must not
//!   depend on hash iteration order
//! - Built once at startup, shared read-only behind an `Arc`

use serde::{Deserialize, Serialize};

use crate::config::validation::{validate_domains, ValidationError};

/// The mirrored GitHub hostnames, in resolution order.
pub const BUILTIN_DOMAINS: [(&str, &str); 18] = [
    ("github.com", "gh."),
    ("avatars.githubusercontent.com", "avatars.gh."),
    ("github.githubassets.com", "assets.gh."),
    ("collector.github.com", "collector.gh."),
    ("api.github.com", "api.gh."),
    ("raw.githubusercontent.com", "raw.gh."),
    ("gist.githubusercontent.com", "gist.gh."),
    ("github.io", "io.gh."),
    ("assets-cdn.github.com", "cdn.gh."),
    ("cdn.jsdelivr.net", "jsdelivr.gh."),
    ("securitylab.github.com", "security.gh."),
    ("www.githubstatus.com", "status.gh."),
    ("npmjs.com", "npmjs.gh."),
    ("git-lfs.github.com", "lfs.gh."),
    ("githubusercontent.com", "usercontent.gh."),
    ("github.global.ssl.fastly.net", "fastly.gh."),
    ("api.npms.io", "npms.gh."),
    ("github.community", "community.gh."),
];

/// Origin whose mirror hosts release and archive links.
pub const GITHUB_ORIGIN: &str = "github.com";

/// One origin host and the subdomain prefix it is served under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainEntry {
    /// Origin hostname, e.g. `api.github.com`.
    pub origin: String,
    /// Proxy prefix, e.g. `api.gh.`.
    pub prefix: String,
}

impl DomainEntry {
    pub fn new(origin: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            prefix: prefix.into(),
        }
    }

    /// The full proxy hostname for this entry under `suffix`.
    pub fn proxy_domain(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }
}

/// The built-in table as owned entries.
pub fn builtin_entries() -> Vec<DomainEntry> {
    BUILTIN_DOMAINS
        .iter()
        .map(|(origin, prefix)| DomainEntry::new(*origin, *prefix))
        .collect()
}

/// A request host matched to a table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub origin_host: String,
    pub proxy_prefix: String,
    /// The operator's base domain: request host minus `proxy_prefix`.
    pub suffix: String,
}

/// Immutable, validated domain table.
#[derive(Debug, Clone)]
pub struct DomainTable {
    entries: Vec<DomainEntry>,
}

impl DomainTable {
    /// The GitHub table.
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Build a table from configured entries, enforcing the prefix invariant.
    pub fn from_entries(entries: Vec<DomainEntry>) -> Result<Self, Vec<ValidationError>> {
        let errors = validate_domains(&entries);
        if errors.is_empty() {
            Ok(Self { entries })
        } else {
            Err(errors)
        }
    }

    pub fn entries(&self) -> &[DomainEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainEntry> {
        self.entries.iter()
    }

    /// First entry whose prefix is a literal prefix of `host`.
    pub fn resolve_host(&self, host: &str) -> Option<ResolvedRoute> {
        self.entries.iter().find_map(|entry| {
            host.strip_prefix(entry.prefix.as_str())
                .map(|suffix| ResolvedRoute {
                    origin_host: entry.origin.clone(),
                    proxy_prefix: entry.prefix.clone(),
                    suffix: suffix.to_string(),
                })
        })
    }

    /// Proxy prefix serving `origin`, if mirrored.
    pub fn prefix_for(&self, origin: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.origin == origin)
            .map(|entry| entry.prefix.as_str())
    }
}

impl Default for DomainTable {
    fn default() -> Self {
        Self::builtin()
    }
}
