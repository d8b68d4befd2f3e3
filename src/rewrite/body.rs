//! Response body rewriting for textual content.

use std::sync::Arc;

use regex::{Captures, Regex};

use crate::rewrite::cache::{PatternFlags, RegexCache};
use crate::rewrite::RewriteContext;
use crate::routing::domains::{DomainTable, GITHUB_ORIGIN};

/// One owner or repository path segment.
const SEGMENT: &str = r#"[^/"'\s]+"#;

/// Rewrites origin URLs in a decoded body to their mirror form.
#[derive(Debug, Clone)]
pub struct BodyRewriter {
    table: Arc<DomainTable>,
    patterns: Arc<RegexCache>,
    relay: Option<String>,
}

impl BodyRewriter {
    /// `relay` is the base that release/archive paths are appended to;
    /// `None` leaves those URLs on the mirror.
    pub fn new(table: Arc<DomainTable>, patterns: Arc<RegexCache>, relay: Option<String>) -> Self {
        Self {
            table,
            patterns,
            relay,
        }
    }

    /// Run all passes over `text`, in order.
    pub fn rewrite(&self, text: &str, ctx: &RewriteContext) -> Result<String, regex::Error> {
        let mut text = self.rewrite_origins(text, ctx)?;

        if let (Some(relay), Some(mirror_prefix)) =
            (self.relay.as_deref(), self.table.prefix_for(GITHUB_ORIGIN))
        {
            text = self.relay_mirror_downloads(&text, ctx, mirror_prefix, relay)?;
            if ctx.proxy_prefix == mirror_prefix {
                text = self.relay_relative_downloads(&text, relay)?;
            }
        }

        Ok(text)
    }

    /// Pass 1: `http(s)://origin` and `//origin` → mirror host.
    fn rewrite_origins(&self, text: &str, ctx: &RewriteContext) -> Result<String, regex::Error> {
        let mut text = text.to_string();

        for entry in self.table.iter() {
            let escaped = regex::escape(&entry.origin);
            let proxy_domain = ctx.proxy_domain(entry);

            let absolute = self
                .patterns
                .get(&format!("https?://{escaped}"), PatternFlags::NONE)?;
            let replacement = format!("https://{proxy_domain}");
            if let Some(rewritten) =
                replace_bounded(&absolute, &text, &replacement, self.relay.as_deref())
            {
                text = rewritten;
            }

            let relative = self.patterns.get(&format!("//{escaped}"), PatternFlags::NONE)?;
            let replacement = format!("//{proxy_domain}");
            if let Some(rewritten) =
                replace_bounded(&relative, &text, &replacement, self.relay.as_deref())
            {
                text = rewritten;
            }
        }

        Ok(text)
    }

    /// Pass 2: release downloads and source archives on the mirror → relay.
    fn relay_mirror_downloads(
        &self,
        text: &str,
        ctx: &RewriteContext,
        mirror_prefix: &str,
        relay: &str,
    ) -> Result<String, regex::Error> {
        let host = format!("https?://{}([^/\"'\\s]+)", regex::escape(mirror_prefix));
        let release = self.patterns.get(
            &format!("{host}(/{SEGMENT}/{SEGMENT}/releases/(?:download|latest/download)/)"),
            PatternFlags::NONE,
        )?;
        let archive = self.patterns.get(
            &format!("{host}(/{SEGMENT}/{SEGMENT}/archive/refs/(?:tags|heads)/)"),
            PatternFlags::NONE,
        )?;

        let suffix = ctx.suffix();
        let to_relay = |caps: &Captures| {
            if &caps[1] == suffix {
                format!("{relay}{}", &caps[2])
            } else {
                caps[0].to_string()
            }
        };

        let text = release.replace_all(text, to_relay).into_owned();
        Ok(archive.replace_all(&text, to_relay).into_owned())
    }

    /// Pass 3: quoted host-less release/archive paths → relay.
    fn relay_relative_downloads(&self, text: &str, relay: &str) -> Result<String, regex::Error> {
        let release = self.patterns.get(
            &format!(r#"(["'])(/{SEGMENT}/{SEGMENT}/releases/download/)"#),
            PatternFlags::NONE,
        )?;
        let archive = self.patterns.get(
            &format!(r#"(["'])(/{SEGMENT}/{SEGMENT}/archive/refs/(?:tags|heads)/)"#),
            PatternFlags::NONE,
        )?;

        let to_relay = |caps: &Captures| format!("{}{relay}{}", &caps[1], &caps[2]);

        let text = release.replace_all(text, to_relay).into_owned();
        Ok(archive.replace_all(&text, to_relay).into_owned())
    }
}

/// Replace matches of `pattern` that end at a URL boundary: `/`, a quote,
/// whitespace or end of text. Matches that complete an occurrence of `relay`
/// are kept, since the relay URL embeds the origin on purpose.
///
/// Returns `None` when nothing was replaced.
pub(crate) fn replace_bounded(
    pattern: &Regex,
    text: &str,
    replacement: &str,
    relay: Option<&str>,
) -> Option<String> {
    let mut out = String::new();
    let mut last = 0;
    let mut replaced = false;

    for m in pattern.find_iter(text) {
        let at_boundary = text[m.end()..]
            .chars()
            .next()
            .map_or(true, |c| matches!(c, '/' | '"' | '\'') || c.is_whitespace());
        if !at_boundary {
            continue;
        }
        if relay.is_some_and(|relay| text[..m.end()].ends_with(relay)) {
            continue;
        }

        out.push_str(&text[last..m.start()]);
        out.push_str(replacement);
        last = m.end();
        replaced = true;
    }

    if !replaced {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}
