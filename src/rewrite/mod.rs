//! Origin → proxy hostname rewriting.
//!
//! # Data Flow
//! ```text
//! upstream 3xx + Location
//!     → redirect.rs (every known origin host → prefix + suffix)
//!
//! upstream textual body
//!     → body.rs pass 1 (absolute + protocol-relative origin URLs)
//!     → body.rs pass 2 (release/archive URLs on the mirror → relay)
//!     → body.rs pass 3 (quoted relative release/archive paths → relay)
//! ```
//!
//! # Design Decisions
//! - Patterns compile through the shared [`cache::RegexCache`]
//! - Patterns never embed the request host, so the cache stays bounded by
//!   the domain table no matter what Host headers arrive
//! - Pass order is fixed: passes 2 and 3 only see mirror URLs that pass 1
//!   produced

pub mod body;
pub mod cache;
pub mod redirect;

pub use body::BodyRewriter;
pub use cache::{PatternFlags, RegexCache};
pub use redirect::RedirectRewriter;

use crate::routing::domains::{DomainEntry, ResolvedRoute};

/// Media types rewritten in addition to `text/*`.
pub const TEXTUAL_MEDIA_TYPES: [&str; 3] = [
    "application/json",
    "application/javascript",
    "application/xml",
];

/// Per-request input to the rewriters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    pub proxy_prefix: String,
    pub request_host: String,
}

impl RewriteContext {
    pub fn new(proxy_prefix: impl Into<String>, request_host: impl Into<String>) -> Self {
        Self {
            proxy_prefix: proxy_prefix.into(),
            request_host: request_host.into(),
        }
    }

    pub fn from_route(route: &ResolvedRoute) -> Self {
        Self::new(
            route.proxy_prefix.clone(),
            format!("{}{}", route.proxy_prefix, route.suffix),
        )
    }

    /// The operator's base domain.
    pub fn suffix(&self) -> &str {
        self.request_host
            .strip_prefix(self.proxy_prefix.as_str())
            .unwrap_or(&self.request_host)
    }

    /// Mirror hostname for `entry` under this request's base domain.
    pub fn proxy_domain(&self, entry: &DomainEntry) -> String {
        entry.proxy_domain(self.suffix())
    }
}

/// Whether a `Content-Type` value names a body that gets rewritten.
pub fn is_textual(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    media_type.starts_with("text/") || TEXTUAL_MEDIA_TYPES.contains(&media_type.as_str())
}
