//! Feed emission.
//!
//! Every `[[feed.channels]]` entry becomes one file under `[feed].dir`:
//!
//! ```text
//! channel.source ──► bucket ──take(items)──► FeedItem ──► jf2 | json_feed | rss ──► file
//! ```
//!
//! Buckets are already sorted newest first, so the window is a prefix.
//! An item that cannot be serialized is logged and left out; a feed file
//! that cannot be written is logged and counted as a failure.

mod jf2;
mod json_feed;
mod rss;

use crate::config::{ChannelConfig, FeedFormat, SiteConfig};
use crate::content::{InteractionKind, Page, PageRef, QuotedContext};
use crate::error::FeedError;
use crate::index::SiteIndex;
use crate::log;
use crate::utils::date::PublishDate;
use std::{fs, path::PathBuf};

// ============================================================================
// Feed Items
// ============================================================================

/// Format-independent view of one page in a feed.
#[derive(Debug)]
pub struct FeedItem<'a> {
    /// Absolute url, also used as the item id.
    pub url: String,
    pub title: &'a str,
    pub published: PublishDate,
    pub content_html: &'a str,
    pub content_text: &'a str,
    /// Absolute url of the primary image.
    pub image: Option<String>,
    /// Interaction kind and absolute target url.
    pub target: Option<(InteractionKind, String)>,
    pub context: Option<&'a QuotedContext>,
    pub categories: &'a [String],
    pub tags: &'a [String],
    pub post_type: &'static str,
}

impl<'a> FeedItem<'a> {
    pub fn from_page(page: &'a Page, config: &SiteConfig) -> Result<Self, FeedError> {
        let url = config.absolute_url(&page.url);
        let Some(published) = page.published_at else {
            return Err(FeedError::Item {
                url,
                reason: "no valid publish date".into(),
            });
        };

        Ok(Self {
            title: page.display_title(),
            published,
            content_html: &page.body,
            content_text: &page.excerpt,
            image: page.image.as_deref().map(|i| config.absolute_url(i)),
            target: page
                .interaction
                .as_ref()
                .map(|i| (i.kind, config.absolute_url(&i.url))),
            context: page.context.as_ref(),
            categories: &page.categories,
            tags: &page.tags,
            post_type: page.post_type(),
            url,
        })
    }
}

/// Convert the newest `limit` pages, dropping the ones that fail.
fn collect_items<'a>(pages: &'a [PageRef], limit: usize, config: &SiteConfig) -> Vec<FeedItem<'a>> {
    pages
        .iter()
        .take(limit)
        .filter_map(|page| match FeedItem::from_page(page, config) {
            Ok(item) => Some(item),
            Err(e) => {
                log!("feed"; "{e}");
                None
            }
        })
        .collect()
}

// ============================================================================
// Public API
// ============================================================================

/// Outcome of emitting every configured channel.
#[derive(Debug, Default)]
pub struct FeedReport {
    /// Files written, relative to the output root.
    pub written: Vec<PathBuf>,
    pub failures: usize,
}

/// Write every configured feed.
pub fn emit(config: &SiteConfig, index: &SiteIndex) -> FeedReport {
    let mut report = FeedReport::default();

    for channel in &config.feed.channels {
        let relative = config.feed.dir.join(&channel.file);
        match emit_one(config, index, channel, &relative) {
            Ok(count) => {
                log!("feed"; "{} ({count} items)", relative.display());
                report.written.push(relative);
            }
            Err(e) => {
                log!("error"; "feed {}: {e}", channel.file.display());
                report.failures += 1;
            }
        }
    }

    report
}

fn emit_one(
    config: &SiteConfig,
    index: &SiteIndex,
    channel: &ChannelConfig,
    relative: &std::path::Path,
) -> Result<usize, FeedError> {
    let pages = source(config, index, &channel.source)?;
    let limit = channel.items.unwrap_or(config.feed.items);
    let items = collect_items(pages, limit, config);

    let body = serialize(channel, &items, config)?;

    let path = config.build.output.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| FeedError::Io(parent.to_path_buf(), e))?;
    }
    fs::write(&path, body).map_err(|e| FeedError::Io(path, e))?;

    Ok(items.len())
}

/// Serialize items in the channel's format.
pub fn serialize(
    channel: &ChannelConfig,
    items: &[FeedItem<'_>],
    config: &SiteConfig,
) -> Result<String, FeedError> {
    match channel.format() {
        Some(FeedFormat::Jf2) => jf2::render(channel, items, config),
        Some(FeedFormat::JsonFeed) => json_feed::render(channel, items, config),
        Some(FeedFormat::Rss) => rss::render(channel, items, config),
        None => Err(FeedError::Serialize(format!(
            "no format for `{}`",
            channel.file.display()
        ))),
    }
}

/// Resolve a channel source: group, `posts`/`stream`, category, then tag.
fn source<'a>(config: &SiteConfig, index: &'a SiteIndex, name: &str) -> Result<&'a [PageRef], FeedError> {
    if config.group(name).is_some() {
        return Ok(index.group(name));
    }

    match name {
        "posts" => return Ok(index.posts()),
        "stream" => return Ok(index.stream()),
        _ => {}
    }

    let category = index.category(name);
    if !category.is_empty() {
        return Ok(category);
    }

    let tag = index.tag(name);
    if !tag.is_empty() {
        return Ok(tag);
    }

    Err(FeedError::UnknownSource(name.to_owned()))
}

/// Feed url of a channel, absolute.
fn feed_url(channel: &ChannelConfig, config: &SiteConfig) -> String {
    let relative = config.feed.dir.join(&channel.file);
    config.absolute_url(&relative.to_string_lossy().replace('\\', "/"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GroupConfig;
    use crate::content::{Interaction, test_page};
    use crate::index::SiteIndexBuilder;
    use tempfile::TempDir;

    pub fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.title = "Coffee Blog".into();
        config.base.author = "Jane".into();
        config.base.email = "jane@coffee.example".into();
        config.base.url = Some("https://coffee.example/".into());
        config.base.avatar = "/assets/me.jpg".into();
        config
    }

    pub fn channel(file: &str, source: &str) -> ChannelConfig {
        ChannelConfig {
            file: PathBuf::from(file),
            title: "Coffee Blog - Posts".into(),
            source: source.into(),
            format: None,
            items: None,
        }
    }

    pub fn like_page() -> Page {
        let mut page = test_page("/likes/2024/a/", "2024-03-02", &["Like"]);
        page.image = Some("/img/cup.jpg".into());
        page.interaction = Some(Interaction {
            kind: InteractionKind::Like,
            url: "https://other.example/post".into(),
        });
        page.context = Some(QuotedContext {
            author_name: Some("Sam".into()),
            author_url: Some("https://other.example".into()),
            author_image: None,
            quote: Some("Great beans.".into()),
        });
        page
    }

    fn index() -> SiteIndex {
        let builder = SiteIndexBuilder::new();
        for i in 1..=5 {
            let mut page = test_page(&format!("/p{i}/"), &format!("2024-01-0{i}"), &["Post"]);
            page.tags = vec!["v60".into()];
            builder.insert(page);
        }
        let mut liked = like_page();
        liked.groups = vec!["likes".into()];
        builder.insert(liked);
        builder.finish()
    }

    #[test]
    fn test_item_fields() {
        let config = config();
        let page = like_page();
        let item = FeedItem::from_page(&page, &config).unwrap();

        assert_eq!(item.url, "https://coffee.example/likes/2024/a/");
        assert_eq!(item.title, "Title of /likes/2024/a/");
        assert_eq!(item.image.as_deref(), Some("https://coffee.example/img/cup.jpg"));
        assert_eq!(
            item.target,
            Some((InteractionKind::Like, "https://other.example/post".into()))
        );
        assert_eq!(item.post_type, "like");
    }

    #[test]
    fn test_undated_item_rejected() {
        let config = config();
        let page = test_page("/about/", "", &[]);
        let err = FeedItem::from_page(&page, &config).unwrap_err();
        assert!(matches!(err, FeedError::Item { url, .. } if url == "https://coffee.example/about/"));
    }

    #[test]
    fn test_window_keeps_newest() {
        let config = config();
        let index = index();
        let items = collect_items(index.posts(), 2, &config);
        let urls: Vec<_> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://coffee.example/likes/2024/a/", "https://coffee.example/p5/"]
        );
    }

    #[test]
    fn test_window_skips_bad_items() {
        let config = config();
        let pages = vec![
            std::sync::Arc::new(test_page("/a/", "2024-01-02", &[])),
            std::sync::Arc::new(test_page("/b/", "", &[])),
            std::sync::Arc::new(test_page("/c/", "2024-01-01", &[])),
        ];
        assert_eq!(collect_items(&pages, 10, &config).len(), 2);
    }

    #[test]
    fn test_source_resolution() {
        let mut config = config();
        config.build.groups = vec![GroupConfig {
            name: "likes".into(),
            category: Some("Like".into()),
            layout: None,
            directory: None,
            mentions: false,
        }];
        let index = index();

        assert_eq!(source(&config, &index, "likes").unwrap().len(), 1);
        assert_eq!(source(&config, &index, "posts").unwrap().len(), 6);
        assert_eq!(source(&config, &index, "Post").unwrap().len(), 5);
        assert_eq!(source(&config, &index, "v60").unwrap().len(), 5);
        assert!(matches!(
            source(&config, &index, "nothing"),
            Err(FeedError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_emit_writes_every_format() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.build.output = dir.path().to_path_buf();
        config.feed.channels = vec![
            channel("posts.xml", "posts"),
            channel("posts.json", "posts"),
            channel("posts.jf2", "posts"),
        ];

        let report = emit(&config, &index());
        assert_eq!(report.failures, 0);
        assert_eq!(report.written.len(), 3);

        let xml = std::fs::read_to_string(dir.path().join("feeds/posts.xml")).unwrap();
        let rss = ::rss::Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(rss.items().len(), 6);
        assert!(rss.items()[0].enclosure().is_some());
        for file in ["posts.xml", "posts.json", "posts.jf2"] {
            assert!(dir.path().join("feeds").join(file).is_file(), "{file}");
        }
    }

    #[test]
    fn test_emit_counts_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.build.output = dir.path().to_path_buf();
        config.feed.channels = vec![channel("missing.xml", "nothing"), channel("posts.json", "posts")];

        let report = emit(&config, &index());
        assert_eq!(report.failures, 1);
        assert_eq!(report.written, vec![PathBuf::from("feeds/posts.json")]);
    }

    #[test]
    fn test_feed_url() {
        let config = config();
        assert_eq!(
            feed_url(&channel("posts.json", "posts"), &config),
            "https://coffee.example/feeds/posts.json"
        );
    }
}
