//! Hyperlink rewriting.
//!
//! Three passes run in a fixed order, each a pure `&str -> String`:
//!
//! 1. `[https://…]` bracketed bare URLs become anchors
//! 2. `[text](https://…)` external links become anchors; relative links stay
//! 3. remaining bare URLs in plain text become anchors
//!
//! Pass 1 and 2 emit no `[`, so neither re-matches the other's output. Pass 3
//! never looks inside anchors, other tags, or Markdown link/image spans.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BRACKETED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(https?://[^\]]+)\]").unwrap());
static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static PROTECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*>.*?</a>|</?[A-Za-z][^<>\n]*>|!?\[[^\]]*\]\([^)]*\)"#).unwrap()
});
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>\[\]"]+"#).unwrap());

/// Run all three passes
pub fn rewrite_links(body: &str) -> String {
    let body = link_bracketed_urls(body);
    let body = link_markdown(&body);
    link_bare_urls(&body)
}

/// Anchor that opens in a new tab
pub fn external_anchor(url: &str, text: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
        url, text
    )
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Pass 1: `[https://example.com]` → anchor showing the URL.
///
/// A bracket directly followed by a complete `(target)` is a regular link and
/// left for pass 2.
pub fn link_bracketed_urls(body: &str) -> String {
    BRACKETED_URL_RE
        .replace_all(body, |caps: &Captures| {
            let end = caps.get(0).map_or(0, |m| m.end());
            if has_link_target(&body[end..]) {
                return caps[0].to_string();
            }
            external_anchor(&caps[1], &caps[1])
        })
        .into_owned()
}

/// True when `rest` opens with a complete `(target)` that pass 2 will pick up
fn has_link_target(rest: &str) -> bool {
    rest.strip_prefix('(')
        .and_then(|inner| inner.find(')'))
        .is_some_and(|close| close > 0)
}

/// Pass 2: `[text](https://…)` → anchor showing `text`.
///
/// Relative links and image embeds are left as they are.
pub fn link_markdown(body: &str) -> String {
    MARKDOWN_LINK_RE
        .replace_all(body, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let url = &caps[2];
            if body[..start].ends_with('!') || !is_external(url) {
                return caps[0].to_string();
            }
            external_anchor(url, &caps[1])
        })
        .into_owned()
}

/// Pass 3: bare `http(s)://` URLs in plain text → anchors.
pub fn link_bare_urls(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;

    for span in PROTECTED_RE.find_iter(body) {
        link_plain_segment(body, cursor, span.start(), &mut out);
        out.push_str(span.as_str());
        cursor = span.end();
    }
    link_plain_segment(body, cursor, body.len(), &mut out);

    out
}

fn link_plain_segment(body: &str, start: usize, end: usize, out: &mut String) {
    let segment = &body[start..end];
    let mut last = 0;

    for m in BARE_URL_RE.find_iter(segment) {
        let before = body[..start + m.start()].chars().next_back();
        let after = body[start + m.end()..].chars().next();
        if before.is_some_and(blocks_before) || after.is_some_and(blocks_after) {
            continue;
        }

        out.push_str(&segment[last..m.start()]);
        out.push_str(&external_anchor(m.as_str(), m.as_str()));
        last = m.end();
    }

    out.push_str(&segment[last..]);
}

fn blocks_before(c: char) -> bool {
    matches!(c, '[' | '<' | '"') || c.is_alphanumeric() || c == '_'
}

fn blocks_after(c: char) -> bool {
    matches!(c, ']' | '>' | '"')
}
