//! JF2 feed serialization.
//!
//! ```json
//! { "type": "feed", "name": "...", "url": "...", "items": [ { "type": "entry", ... } ] }
//! ```
//!
//! The interaction target is written under its microformats property
//! (`like-of`, `in-reply-to`, ...) and its quoted context, when present,
//! lands in `refs` keyed by the target url.

use super::{FeedItem, feed_url};
use crate::config::{ChannelConfig, SiteConfig};
use crate::error::FeedError;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
struct Feed<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    url: String,
    items: Vec<Entry<'a>>,
}

#[derive(Serialize)]
struct Card<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    html: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct Entry<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    url: &'a str,
    name: &'a str,
    category: Vec<&'a str>,
    author: Card<'a>,
    published: String,
    #[serde(rename = "post-type")]
    post_type: &'static str,
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
    /// Target property, flattened in as e.g. `"like-of": "https://..."`.
    #[serde(flatten)]
    target: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    refs: Map<String, Value>,
}

pub fn render(channel: &ChannelConfig, items: &[FeedItem<'_>], config: &SiteConfig) -> Result<String, FeedError> {
    let author = || Card {
        kind: "card",
        name: Some(&config.base.author),
        url: Some(config.base_url()),
        photo: (!config.base.avatar.is_empty()).then_some(config.base.avatar.as_str()),
    };

    let items = items
        .iter()
        .map(|item| entry(item, author()))
        .collect::<Result<Vec<_>, _>>()?;

    let feed = Feed {
        kind: "feed",
        name: &channel.title,
        url: feed_url(channel, config),
        items,
    };
    Ok(serde_json::to_string_pretty(&feed)?)
}

fn entry<'a>(item: &'a FeedItem<'_>, author: Card<'a>) -> Result<Entry<'a>, FeedError> {
    let mut target = Map::new();
    let mut refs = Map::new();

    if let Some((kind, url)) = &item.target {
        target.insert(kind.property().to_owned(), Value::String(url.clone()));

        if let Some(context) = item.context {
            let cite = Cite {
                kind: "cite",
                url,
                author: Card {
                    kind: "card",
                    name: context.author_name.as_deref(),
                    url: context.author_url.as_deref(),
                    photo: context.author_image.as_deref(),
                },
                content: context.quote.as_deref(),
            };
            refs.insert(url.clone(), serde_json::to_value(cite)?);
        }
    }

    Ok(Entry {
        kind: "entry",
        url: &item.url,
        name: item.title,
        category: item
            .categories
            .iter()
            .chain(item.tags)
            .map(String::as_str)
            .collect(),
        author,
        published: item.published.rfc3339(),
        post_type: item.post_type,
        content: Content {
            html: item.content_html,
            text: item.content_text,
        },
        photo: item.image.as_deref(),
        target,
        refs,
    })
}

#[derive(Serialize)]
struct Cite<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    url: &'a str,
    author: Card<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::super::tests::{channel, config, like_page};
    use super::*;

    #[test]
    fn test_jf2_entry() {
        let config = config();
        let page = like_page();
        let item = FeedItem::from_page(&page, &config).unwrap();

        let out = render(&channel("likes.jf2", "likes"), &[item], &config).unwrap();
        let feed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(feed["type"], "feed");
        assert_eq!(feed["url"], "https://coffee.example/feeds/likes.jf2");

        let entry = &feed["items"][0];
        assert_eq!(entry["type"], "entry");
        assert_eq!(entry["url"], "https://coffee.example/likes/2024/a/");
        assert_eq!(entry["post-type"], "like");
        assert_eq!(entry["like-of"], "https://other.example/post");
        assert_eq!(entry["published"], "2024-03-02T00:00:00+00:00");
        assert_eq!(entry["photo"], "https://coffee.example/img/cup.jpg");
        assert_eq!(entry["author"]["name"], "Jane");
        assert_eq!(entry["content"]["text"], "Excerpt.");
        assert_eq!(entry["category"], serde_json::json!(["Like"]));

        let cite = &entry["refs"]["https://other.example/post"];
        assert_eq!(cite["type"], "cite");
        assert_eq!(cite["author"]["name"], "Sam");
        assert_eq!(cite["content"], "Great beans.");
    }

    #[test]
    fn test_jf2_plain_article() {
        let config = config();
        let page = crate::content::test_page("/a/", "2024-01-01", &["Post"]);
        let item = FeedItem::from_page(&page, &config).unwrap();

        let out = render(&channel("posts.jf2", "posts"), &[item], &config).unwrap();
        let feed: Value = serde_json::from_str(&out).unwrap();
        let entry = &feed["items"][0];

        assert_eq!(entry["post-type"], "article");
        assert!(entry.get("refs").is_none());
        assert!(entry.get("photo").is_none());
    }
}
