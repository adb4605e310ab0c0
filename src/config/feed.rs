//! `[feed]` section configuration.
//!
//! Each `[[feed.channels]]` entry describes one output file: which index
//! bucket it reads, how it is titled, and which format it is written in.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serialization format of a feed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    /// RSS 2.0 XML.
    Rss,
    /// JSON Feed 1.1.
    JsonFeed,
    /// JF2 feed object.
    Jf2,
}

impl FeedFormat {
    /// Infer the format from a feed file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "xml" | "rss" => Some(Self::Rss),
            "json" => Some(Self::JsonFeed),
            "jf2" => Some(Self::Jf2),
            _ => None,
        }
    }
}

/// `[feed]` section in almanac.toml.
///
/// # Example
/// ```toml
/// [feed]
/// dir = "feeds"
/// items = 20
///
/// [[feed.channels]]
/// file = "likes.jf2"
/// title = "Coffee Blog - Likes"
/// source = "likes"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Directory under the output root that receives every feed file.
    #[serde(default = "defaults::feed::dir")]
    #[educe(Default = defaults::feed::dir())]
    pub dir: PathBuf,

    /// Default number of most recent items per feed.
    #[serde(default = "defaults::feed::items")]
    #[educe(Default = defaults::feed::items())]
    pub items: usize,

    /// Feed descriptors.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// `[[feed.channels]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// File name under `[feed].dir`.
    pub file: PathBuf,
    pub title: String,
    /// Group, `posts`, `stream`, category or tag name.
    pub source: String,
    /// Explicit format; inferred from the file extension when absent.
    #[serde(default)]
    pub format: Option<FeedFormat>,
    /// Overrides `[feed].items` for this channel.
    #[serde(default)]
    pub items: Option<usize>,
}

impl ChannelConfig {
    pub fn format(&self) -> Option<FeedFormat> {
        self.format.or_else(|| FeedFormat::from_path(&self.file))
    }
}
