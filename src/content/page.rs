//! The enriched, render-ready form of a document.

use super::document::{DocumentKind, QuotedContext};
use crate::utils::date::PublishDate;
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

/// Shared handle stored in every index bucket a page belongs to.
pub type PageRef = Arc<Page>;

/// A page ready for rendering.
///
/// Serialized as the `page` template variable. The rendered body is exposed
/// as `page.content`.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub url: String,
    /// Output file relative to the output root.
    #[serde(skip)]
    pub output: PathBuf,
    pub slug: String,
    pub title: String,
    pub layout: String,
    pub kind: DocumentKind,
    /// Source path relative to the content root.
    pub source: PathBuf,
    /// Top-level content subdirectory.
    pub directory: String,

    pub excerpt: String,
    pub description: String,
    pub meta_description: String,

    /// `2024-03-01 00:00:00-00:00`, empty when undated.
    pub full_date: String,
    /// `March 01, 2024`, empty when undated.
    pub published: String,
    pub date: Option<DateParts>,
    #[serde(skip)]
    pub published_at: Option<PublishDate>,

    #[serde(rename = "content")]
    pub body: String,

    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Names of the configured groups this page belongs to.
    pub groups: Vec<String>,
    pub images: Vec<String>,
    pub image: Option<String>,
    pub photo_grid: bool,
    pub is_note: bool,

    pub interaction: Option<Interaction>,
    pub context: Option<QuotedContext>,

    /// Front-matter keys without a dedicated field.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Page {
    /// Year, month and day buckets, when dated.
    pub fn date_keys(&self) -> Option<(String, String, String)> {
        self.date.as_ref().map(|d| {
            (
                d.year.clone(),
                format!("{}-{}", d.year, d.month),
                format!("{}-{}-{}", d.year, d.month, d.day),
            )
        })
    }

    /// Title, or the url when the page has none.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { &self.url } else { &self.title }
    }

    /// Microformats post type, used by JF2 feeds.
    pub fn post_type(&self) -> &'static str {
        match &self.interaction {
            Some(i) => i.kind.as_str(),
            None if self.is_note => "note",
            None => "article",
        }
    }
}

/// Zero-padded date components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl From<PublishDate> for DateParts {
    fn from(date: PublishDate) -> Self {
        let (year, month, day) = date.ymd();
        Self { year, month, day }
    }
}

/// What an interaction post responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Reply,
    Like,
    Bookmark,
    Repost,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Like => "like",
            Self::Bookmark => "bookmark",
            Self::Repost => "repost",
        }
    }

    /// Microformats property naming the target, e.g. `in-reply-to`.
    pub fn property(self) -> &'static str {
        match self {
            Self::Reply => "in-reply-to",
            Self::Like => "like-of",
            Self::Bookmark => "bookmark-of",
            Self::Repost => "repost-of",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub url: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::date::parse_date;

    /// Minimal dated page for index and generator tests.
    pub fn page(url: &str, full_date: &str, categories: &[&str]) -> Page {
        let published_at = parse_date(full_date).map(PublishDate);
        Page {
            url: url.to_owned(),
            output: crate::utils::slug::url_to_output(url),
            slug: url.trim_matches('/').rsplit('/').next().unwrap_or_default().to_owned(),
            title: format!("Title of {url}"),
            layout: "post".to_owned(),
            kind: DocumentKind::Post,
            source: PathBuf::from("_posts/x.md"),
            directory: "_posts".to_owned(),
            excerpt: "Excerpt.".to_owned(),
            description: "Excerpt.".to_owned(),
            meta_description: "Excerpt....".to_owned(),
            full_date: published_at.map(|d| d.full_date()).unwrap_or_default(),
            published: published_at.map(|d| d.long_date()).unwrap_or_default(),
            date: published_at.map(DateParts::from),
            published_at,
            body: "<p>Excerpt.</p>".to_owned(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            tags: vec![],
            groups: vec![],
            images: vec![],
            image: None,
            photo_grid: false,
            is_note: false,
            interaction: None,
            context: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_date_keys() {
        let p = page("/2024/03/01/a/", "2024-03-01", &[]);
        assert_eq!(
            p.date_keys(),
            Some(("2024".into(), "2024-03".into(), "2024-03-01".into()))
        );
        assert_eq!(page("/about/", "", &[]).date_keys(), None);
    }

    #[test]
    fn test_body_serializes_as_content() {
        let value = serde_json::to_value(page("/a/", "2024-03-01", &["Post"])).unwrap();
        assert_eq!(value["content"], "<p>Excerpt.</p>");
        assert_eq!(value["kind"], "post");
        assert_eq!(value["date"]["month"], "03");
        assert!(value.get("body").is_none());
        assert!(value.get("published_at").is_none());
    }

    #[test]
    fn test_post_type() {
        let mut p = page("/a/", "", &[]);
        assert_eq!(p.post_type(), "article");
        p.is_note = true;
        assert_eq!(p.post_type(), "note");
        p.interaction = Some(Interaction {
            kind: InteractionKind::Like,
            url: "https://x.example".into(),
        });
        assert_eq!(p.post_type(), "like");
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let mut p = page("/a/", "", &[]);
        p.title.clear();
        assert_eq!(p.display_title(), "/a/");
    }
}
