//! JSON Feed 1.1 serialization.

use super::{FeedItem, feed_url};
use crate::config::{ChannelConfig, SiteConfig};
use crate::error::FeedError;
use serde::Serialize;

const VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Serialize)]
struct Feed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    language: &'a str,
    authors: [Author<'a>; 1],
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct Author<'a> {
    name: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
}

#[derive(Serialize)]
struct Item<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    content_html: &'a str,
    content_text: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    /// Target of a like, reply, bookmark or repost.
    #[serde(skip_serializing_if = "Option::is_none")]
    external_url: Option<&'a str>,
}

pub fn render(channel: &ChannelConfig, items: &[FeedItem<'_>], config: &SiteConfig) -> Result<String, FeedError> {
    let base = &config.base;
    let feed = Feed {
        version: VERSION,
        title: &channel.title,
        home_page_url: config.base_url(),
        feed_url: feed_url(channel, config),
        description: &base.description,
        language: &base.language,
        authors: [Author {
            name: &base.author,
            url: config.base_url(),
            avatar: (!base.avatar.is_empty()).then(|| config.absolute_url(&base.avatar)),
        }],
        items: items.iter().map(item).collect(),
    };

    Ok(serde_json::to_string_pretty(&feed)?)
}

fn item<'a>(item: &'a FeedItem<'_>) -> Item<'a> {
    Item {
        id: &item.url,
        url: &item.url,
        title: item.title,
        content_html: item.content_html,
        content_text: item.content_text,
        date_published: item.published.rfc3339(),
        tags: item
            .categories
            .iter()
            .chain(item.tags)
            .map(String::as_str)
            .collect(),
        image: item.image.as_deref(),
        external_url: item.target.as_ref().map(|(_, url)| url.as_str()),
    }
}
