//! RSS 2.0 serialization.
//!
//! Built with the `rss` crate builders and checked with its validator.
//! Items that fail validation are logged and dropped; a channel that fails
//! validation fails the feed.

use super::FeedItem;
use crate::config::{ChannelConfig, SiteConfig};
use crate::error::FeedError;
use crate::log;
use regex::Regex;
use rss::{
    ChannelBuilder, EnclosureBuilder, GuidBuilder, ImageBuilder, ItemBuilder, validation::Validate,
};
use std::{fs, path::Path, sync::LazyLock};

const GENERATOR: &str = concat!("almanac ", env!("CARGO_PKG_VERSION"));

pub fn render(channel: &ChannelConfig, items: &[FeedItem<'_>], config: &SiteConfig) -> Result<String, FeedError> {
    let author = normalize_rss_author(config);
    let items: Vec<_> = items
        .iter()
        .map(|item| to_rss_item(item, author.clone(), config))
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(e) => {
                log!("feed"; "{}: dropped from rss: {e}", item.link().unwrap_or_default());
                false
            }
        })
        .collect();

    let base = &config.base;
    // RSS channel images must be GIF, JPEG or PNG.
    let image = channel_image_allowed(&base.logo).then(|| {
        ImageBuilder::default()
            .url(config.absolute_url(&base.logo))
            .title(channel.title.clone())
            .link(config.base_url().to_owned())
            .build()
    });

    let description = if base.description.is_empty() {
        channel.title.clone()
    } else {
        base.description.clone()
    };

    let rss = ChannelBuilder::default()
        .title(channel.title.clone())
        .link(config.base_url().to_owned())
        .description(description)
        .language((!base.language.is_empty()).then(|| base.language.clone()))
        .generator(GENERATOR.to_owned())
        .managing_editor(author)
        .image(image)
        .items(items)
        .build();

    rss.validate()
        .map_err(|e| FeedError::Serialize(format!("rss validation failed: {e}")))?;
    Ok(rss.to_string())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn to_rss_item(item: &FeedItem<'_>, author: Option<String>, config: &SiteConfig) -> rss::Item {
    let enclosure = item.image.as_ref().map(|url| {
        EnclosureBuilder::default()
            .url(url.clone())
            .length(enclosure_length(url, config).to_string())
            .mime_type(image_mime(url).to_owned())
            .build()
    });

    ItemBuilder::default()
        .title(item.title.to_owned())
        .link(item.url.clone())
        .guid(GuidBuilder::default().permalink(true).value(item.url.clone()).build())
        .description(item.content_text.to_owned())
        .content(item.content_html.to_owned())
        .enclosure(enclosure)
        .author(author)
        .pub_date(item.published.rfc2822())
        .build()
}

/// Byte size of a site-local image, or 1 when it cannot be found.
///
/// RSS validators reject a zero enclosure length.
fn enclosure_length(url: &str, config: &SiteConfig) -> u64 {
    let base = config.base_url();
    let local = if base.is_empty() {
        url.strip_prefix('/')
    } else {
        url.strip_prefix(base).map(|rest| rest.trim_start_matches('/'))
    };

    local
        .map(|rel| rel.split(['?', '#']).next().unwrap_or(rel))
        .filter(|rel| !rel.is_empty())
        .and_then(|rel| fs::metadata(config.build.content.join(rel)).ok())
        .map(|meta| meta.len())
        .filter(|len| *len > 0)
        .unwrap_or(1)
}

fn channel_image_allowed(logo: &str) -> bool {
    [".gif", ".jpeg", ".jpg", ".png"].iter().any(|ext| logo.ends_with(ext))
}

/// Mime type of an image url, judged by extension.
fn image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// Author in RSS form: `email@example.com (Name)`.
///
/// The site author is used as is when already in that form, otherwise it
/// is combined with the site email. `None` without an email.
fn normalize_rss_author(config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    let author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.clone());
    }

    let email = &config.base.email;
    match (email.is_empty(), author.is_empty()) {
        (true, _) => None,
        (false, true) => Some(email.clone()),
        (false, false) => Some(format!("{email} ({author})")),
    }
}
