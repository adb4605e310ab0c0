//! Raw documents and their front matter.
//!
//! A document is a file under a per-type subdirectory of the content root,
//! headed by a YAML front-matter block:
//!
//! ```text
//! ---
//! layout: post
//! categories: [Post, Coffee (Series)]
//! published: 2024-03-01T08:00:00
//! ---
//! # Hi
//!
//! First paragraph text.
//! ```

use crate::error::DocumentError;
use gray_matter::{Matter, engine::YAML};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Document
// ============================================================================

/// Where a document comes from, which decides its URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Dated long-form post under the posts directory.
    Post,
    /// Everything else: notes, likes, template pages.
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A parsed content file. Immutable once read.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the content root.
    pub relative: PathBuf,
    /// Top-level content subdirectory (`_posts`, `_notes`, `templates`, ...).
    pub directory: String,
    pub kind: DocumentKind,
    pub format: SourceFormat,
    /// `None` when the file has no front matter or an empty block.
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

impl Document {
    /// Read and parse a document from disk.
    pub fn load(path: &Path, content_root: &Path, posts_dir: &str) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path).map_err(|e| DocumentError::Io(path.to_path_buf(), e))?;
        let relative = path.strip_prefix(content_root).unwrap_or(path);
        Self::parse(relative, &raw, posts_dir)
    }

    /// Parse raw file contents.
    pub fn parse(relative: &Path, raw: &str, posts_dir: &str) -> Result<Self, DocumentError> {
        let format = SourceFormat::from_path(relative).ok_or_else(|| {
            DocumentError::MissingMetadata(format!("`{}` is not markdown or html", relative.display()))
        })?;

        let directory = relative
            .components()
            .next()
            .filter(|_| relative.components().count() > 1)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_default();

        let kind = if directory == posts_dir {
            DocumentKind::Post
        } else {
            DocumentKind::Page
        };

        let matter = Matter::<YAML>::new();
        let parsed = matter
            .parse::<serde_yaml::Value>(raw)
            .map_err(|e| malformed(relative, &e.to_string()))?;

        let front_matter = match parsed.data {
            None | Some(serde_yaml::Value::Null) => None,
            Some(serde_yaml::Value::Mapping(map)) if map.is_empty() => None,
            Some(value) => Some(
                serde_yaml::from_value::<FrontMatter>(value)
                    .map_err(|e| malformed(relative, &e.to_string()))?,
            ),
        };

        Ok(Self {
            relative: relative.to_path_buf(),
            directory,
            kind,
            format,
            front_matter,
            body: parsed.content,
        })
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        self.relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn malformed(relative: &Path, reason: &str) -> DocumentError {
    DocumentError::MissingMetadata(format!(
        "front matter of `{}` is not valid: {reason}",
        relative.display()
    ))
}

// ============================================================================
// Front Matter
// ============================================================================

/// Typed front matter with an open map for custom keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub categories: Option<OneOrMany>,
    pub category: Option<OneOrMany>,
    pub tags: Option<OneOrMany>,
    pub published: Option<PublishedField>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub ate: bool,
    pub meta_description: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageField>,
    #[serde(rename = "in-reply-to", alias = "in_reply_to")]
    pub in_reply_to: Option<TargetField>,
    #[serde(rename = "like-of", alias = "like_of")]
    pub like_of: Option<TargetField>,
    #[serde(rename = "bookmark-of", alias = "bookmark_of")]
    pub bookmark_of: Option<TargetField>,
    #[serde(rename = "repost-of", alias = "repost_of")]
    pub repost_of: Option<TargetField>,
    pub context: Option<QuotedContext>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A field written either as a scalar or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

/// Explicit publish date: UNIX seconds or an ISO string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PublishedField {
    Timestamp(i64),
    Text(String),
}

/// Image metadata in any of its three spellings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    Url(String),
    List(Vec<ImageField>),
    Object {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        value: Option<String>,
    },
}

impl ImageField {
    /// The single image this field points at.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()).filter(|u| !u.is_empty()),
            Self::List(items) => items.iter().find_map(Self::resolve),
            Self::Object { url, src, value } => url
                .as_ref()
                .or(src.as_ref())
                .or(value.as_ref())
                .filter(|u| !u.is_empty())
                .cloned(),
        }
    }
}

/// Target of a reply, like, bookmark or repost.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TargetField {
    Url(String),
    Object { url: String },
}

impl TargetField {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Object { url } => url,
        }
    }
}

/// Quoted context of the target being responded to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotedContext {
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub author_image: Option<String>,
    pub quote: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
