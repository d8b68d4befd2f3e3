//! Inbound request classification.
//!
//! # Responsibilities
//! - Refuse paths that expose login/session flows through the mirror
//! - Answer CORS preflights without touching the domain table
//! - Map the request host onto a domain table entry
//! - Strip absolute URLs that client-side code appends to commit-info paths
//!
//! # Design Decisions
//! - Block check runs first, then preflight, then host lookup
//! - Blocking is exact or `path + "/"` prefix, never substring
//! - Unknown hosts are an ordinary outcome, not an error

use std::sync::Arc;

use axum::http::Method;

use crate::rewrite::cache::{PatternFlags, RegexCache};
use crate::routing::domains::{DomainTable, ResolvedRoute};

/// Paths that are never proxied.
pub const BLOCKED_PATHS: [&str; 7] = [
    "/",
    "/login",
    "/signin",
    "/signup",
    "/copilot",
    "/github-copilot",
    "/session",
];

/// `/{owner}/{repo}/(latest-commit|tree-commit-info)/{ref}` followed by an
/// embedded absolute URL, literal or percent-encoded.
const EMBEDDED_URL_PATTERN: &str =
    r"(/[^/]+/[^/]+/(?:latest-commit|tree-commit-info)/[^/]+)/https?(?::|%3a)(?://|%2f%2f).*";

/// Outcome of classifying one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 301 to `/404`.
    Blocked,
    /// 204 with CORS headers.
    Preflight,
    /// Host matches no proxy prefix.
    NotFound,
    /// Forward to the origin with the sanitized path.
    Resolved { route: ResolvedRoute, path: String },
}

/// Classifies requests against the domain table.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<DomainTable>,
    patterns: Arc<RegexCache>,
}

impl Resolver {
    pub fn new(table: Arc<DomainTable>, patterns: Arc<RegexCache>) -> Self {
        Self { table, patterns }
    }

    /// Decide what to do with a request for `host` + `path`.
    pub fn resolve(
        &self,
        host: &str,
        path: &str,
        method: &Method,
    ) -> Result<Resolution, regex::Error> {
        if is_blocked(path) {
            return Ok(Resolution::Blocked);
        }

        if method == Method::OPTIONS {
            return Ok(Resolution::Preflight);
        }

        let Some(route) = self.table.resolve_host(&host.to_ascii_lowercase()) else {
            return Ok(Resolution::NotFound);
        };

        let path = self.sanitize_path(path)?;
        Ok(Resolution::Resolved { route, path })
    }

    /// Truncate commit-info paths at the ref segment when an absolute URL follows.
    pub fn sanitize_path(&self, path: &str) -> Result<String, regex::Error> {
        let pattern = self
            .patterns
            .get(EMBEDDED_URL_PATTERN, PatternFlags::CASE_INSENSITIVE)?;
        Ok(pattern.replace(path, "${1}").into_owned())
    }
}

/// Exact match or `blocked + "/"` prefix match against [`BLOCKED_PATHS`].
pub fn is_blocked(path: &str) -> bool {
    BLOCKED_PATHS.iter().any(|blocked| {
        path == *blocked
            || path
                .strip_prefix(blocked)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(DomainTable::builtin()), Arc::new(RegexCache::new()))
    }

    #[test]
    fn test_blocked_paths_exact_or_nested() {
        assert!(is_blocked("/login"));
        assert!(is_blocked("/login/x"));
        assert!(is_blocked("/session"));
        assert!(is_blocked("/github-copilot/signup"));
        assert!(!is_blocked("/logins"));
        assert!(!is_blocked("/sessions/new"));
        assert!(!is_blocked("/acme/login"));
    }

    #[test]
    fn test_root_blocks_everything_below_it() {
        // "/" + "/" is "//", so only the bare root and double-slash paths block.
        assert!(is_blocked("/"));
        assert!(is_blocked("//evil"));
        assert!(!is_blocked("/acme/tool"));
    }

    #[test]
    fn test_block_check_precedes_preflight() {
        let r = resolver();
        assert_eq!(
            r.resolve("gh.example.com", "/login", &Method::OPTIONS).unwrap(),
            Resolution::Blocked
        );
    }

    #[test]
    fn test_preflight_skips_host_resolution() {
        let r = resolver();
        assert_eq!(
            r.resolve("unknown.example", "/acme/tool", &Method::OPTIONS).unwrap(),
            Resolution::Preflight
        );
    }

    #[test]
    fn test_unknown_host_is_not_found() {
        let r = resolver();
        assert_eq!(
            r.resolve("example.com", "/acme/tool", &Method::GET).unwrap(),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_host_match_ignores_case() {
        let r = resolver();
        let Resolution::Resolved { route, path } =
            r.resolve("RAW.GH.Example.com", "/acme/tool/main/README.md", &Method::GET).unwrap()
        else {
            panic!("expected a resolved route");
        };
        assert_eq!(route.origin_host, "raw.githubusercontent.com");
        assert_eq!(route.suffix, "example.com");
        assert_eq!(path, "/acme/tool/main/README.md");
    }

    #[test]
    fn test_sanitize_percent_encoded_url() {
        let r = resolver();
        assert_eq!(
            r.sanitize_path("/acme/tool/latest-commit/main/https%3A%2F%2Fattacker.example%2Fx")
                .unwrap(),
            "/acme/tool/latest-commit/main"
        );
    }

    #[test]
    fn test_sanitize_literal_and_half_encoded_url() {
        let r = resolver();
        assert_eq!(
            r.sanitize_path("/acme/tool/tree-commit-info/v1.2/https://attacker.example/x/y")
                .unwrap(),
            "/acme/tool/tree-commit-info/v1.2"
        );
        assert_eq!(
            r.sanitize_path("/acme/tool/latest-commit/main/https%3A//attacker.example/x")
                .unwrap(),
            "/acme/tool/latest-commit/main"
        );
    }

    #[test]
    fn test_sanitize_leaves_ordinary_paths() {
        let r = resolver();
        for path in [
            "/acme/tool/latest-commit/main",
            "/acme/tool/latest-commit/main/src/lib.rs",
            "/acme/tool/blob/main/https.md",
        ] {
            assert_eq!(r.sanitize_path(path).unwrap(), path);
        }
    }
}
