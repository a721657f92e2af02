//! Content extraction used by the task variants.
//!
//! Deliberately small: link discovery, the next-page marker test, and the
//! title of a terminal page. Anything richer belongs in a real HTML parser
//! behind the [`Fetcher`](crate::fetch::Fetcher) seam.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("href pattern"));

static NEXT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Next\s*(?:»|&#187;)").expect("next-page pattern"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h1[^>]*>(.*?)</h1>").expect("title pattern"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// All `href` targets in the content, de-duplicated, in first-seen order.
///
/// Fragment-only links are skipped. Empty content yields no links.
pub fn links(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in HREF.captures_iter(html) {
        let href = &caps[1];
        if href.starts_with('#') {
            continue;
        }
        if seen.insert(href.to_string()) {
            out.push(href.to_string());
        }
    }
    out
}

/// Whether the content carries a "Next »" pagination marker.
///
/// Matches both the raw glyph and its HTML entity form. Empty content
/// never matches, so a failed or empty fetch cannot extend pagination.
pub fn has_next(html: &str) -> bool {
    NEXT_MARKER.is_match(html)
}

/// The first `<h1>` heading with inner markup stripped, if present.
pub fn title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|caps| TAG.replace_all(&caps[1], "").trim().to_string())
        .filter(|t| !t.is_empty())
}
