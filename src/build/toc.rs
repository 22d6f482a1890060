//! Heading extraction from rendered HTML, feeding the table of contents.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Matches `<h1>`–`<h3>` elements carrying an `id` attribute.
///
/// The regex crate has no backreferences, so the closing level is captured
/// separately and compared in code.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h([1-3])\b[^>]*?\sid="([^"]+)"[^>]*>(.*?)</h([1-6])>"#)
        .expect("heading pattern is valid")
});

/// Matches any tag, for stripping markup from heading text.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// A heading found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// The heading level (1-3)
    pub level: u8,
    /// The heading text, markup stripped
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
}

/// Extract level 1-3 headings with an `id` attribute, in document order.
pub fn extract_headings(html: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(html)
        .filter(|caps| caps[1] == caps[4])
        .filter_map(|caps| {
            let level = caps[1].parse().ok()?;
            Some(Heading {
                level,
                id: caps[2].to_string(),
                text: TAG_RE.replace_all(&caps[3], "").trim().to_string(),
            })
        })
        .collect()
}
