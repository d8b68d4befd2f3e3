//! `Location` rewriting for upstream redirects.
//!
//! Every known origin host inside the location is swapped for its mirror
//! host, including hosts embedded in query parameters (`return_to=...`),
//! whether literal or percent-encoded.

use std::sync::Arc;

use axum::http::StatusCode;

use crate::rewrite::cache::{PatternFlags, RegexCache};
use crate::rewrite::RewriteContext;
use crate::routing::domains::DomainTable;

/// Redirect statuses whose `Location` is rewritten.
pub const REDIRECT_STATUS_CODES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

pub fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_STATUS_CODES.contains(&status)
}

/// Rewrites origin hostnames inside redirect targets.
#[derive(Debug, Clone)]
pub struct RedirectRewriter {
    table: Arc<DomainTable>,
    patterns: Arc<RegexCache>,
    /// Alternation of every origin host, longest first.
    hosts_pattern: String,
}

impl RedirectRewriter {
    pub fn new(table: Arc<DomainTable>, patterns: Arc<RegexCache>) -> Self {
        let mut origins: Vec<&str> = table.iter().map(|entry| entry.origin.as_str()).collect();
        origins.sort_by_key(|origin| std::cmp::Reverse(origin.len()));
        let hosts_pattern = origins
            .iter()
            .map(|origin| regex::escape(origin))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            table,
            patterns,
            hosts_pattern,
        }
    }

    /// Rewrite every origin host occurrence in `location`.
    pub fn rewrite(&self, location: &str, ctx: &RewriteContext) -> Result<String, regex::Error> {
        let pattern = self.patterns.get(&self.hosts_pattern, PatternFlags::CASE_INSENSITIVE)?;

        let mut out = String::with_capacity(location.len());
        let mut last = 0;
        for m in pattern.find_iter(location) {
            if !host_starts_at(location, m.start()) || !host_ends_at(location, m.end()) {
                continue;
            }
            let Some(entry) = self
                .table
                .iter()
                .find(|entry| entry.origin.eq_ignore_ascii_case(m.as_str()))
            else {
                continue;
            };

            out.push_str(&location[last..m.start()]);
            out.push_str(&ctx.proxy_domain(entry));
            last = m.end();
        }
        out.push_str(&location[last..]);

        Ok(out)
    }
}

/// A host may start after any non-label character, or right after a
/// percent-escape such as the `%2F` in an encoded `return_to` URL.
fn host_starts_at(text: &str, start: usize) -> bool {
    let before = &text[..start];
    match before.chars().next_back() {
        Some(c) if c.is_ascii_alphanumeric() || c == '-' => is_percent_escape_tail(before),
        _ => true,
    }
}

/// A host ends unless another label character or label follows.
fn host_ends_at(text: &str, end: usize) -> bool {
    let mut rest = text[end..].chars();
    match rest.next() {
        None => true,
        Some(c) if c.is_ascii_alphanumeric() || c == '-' => false,
        Some('.') => !rest.next().is_some_and(|c| c.is_ascii_alphanumeric()),
        Some(_) => true,
    }
}

fn is_percent_escape_tail(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 3
        && bytes[bytes.len() - 3] == b'%'
        && bytes[bytes.len() - 2..].iter().all(u8::is_ascii_hexdigit)
}
