//! Lightweight HTML text helpers.
//!
//! Rendered bodies are small and come from our own markdown pass, so a
//! handful of regexes is enough: no DOM is built.

use regex::{Captures, Regex};
use std::{borrow::Cow, sync::LazyLock};

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static RE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").unwrap());

static RE_IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Decode the entities our markdown renderer emits.
pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Visible text of an HTML fragment.
pub fn plain_text(html: &str) -> String {
    decode_entities(&RE_TAG.replace_all(html, ""))
}

/// Text of the first `<p>` element, if any.
pub fn first_paragraph_text(html: &str) -> Option<String> {
    RE_PARAGRAPH
        .captures(html)
        .map(|caps| plain_text(&caps[1]).trim().to_owned())
}

/// Every `<img src>` in document order.
pub fn image_sources(html: &str) -> Vec<String> {
    RE_IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Apply `f` to text between tags, leaving tags and attributes untouched.
pub fn map_text_nodes<F>(html: &str, mut f: F) -> String
where
    F: FnMut(&str) -> Cow<'_, str>,
{
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for tag in RE_TAG.find_iter(html) {
        out.push_str(&f(&html[last..tag.start()]));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&f(&html[last..]));
    out
}

/// Replace every regex match inside text nodes only.
pub fn replace_in_text<R>(html: &str, re: &Regex, mut rep: R) -> String
where
    R: FnMut(&Captures<'_>) -> String,
{
    map_text_nodes(html, |text| re.replace_all(text, |caps: &Captures<'_>| rep(caps)))
}
