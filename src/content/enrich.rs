//! Metadata enrichment: document in, page (or skip) out.
//!
//! # Steps
//!
//! 1. Skip empty front matter or an empty body
//! 2. Require a `layout` and check its chain terminates
//! 3. Merge categories (`categories`, `category`, `ate` → `Eat`)
//! 4. Resolve the publish date; skip future-scheduled content
//! 5. Render the body, take excerpt and descriptions
//! 6. Expand mentions (posts, mention-enabled groups) and hashtags (notes)
//! 7. Derive title, url, slug, images and interaction target

use super::document::{Document, DocumentKind, FrontMatter, PublishedField, SourceFormat};
use super::mention::{MentionDirectory, strip_markers};
use super::page::{DateParts, Interaction, InteractionKind, Page};
use crate::config::SiteConfig;
use crate::error::DocumentError;
use crate::log;
use crate::template::LayoutCache;
use crate::utils::{
    date::{PublishDate, from_timestamp, parse_date, split_dated_stem},
    html::{first_paragraph_text, image_sources, plain_text, replace_in_text},
    slug::{content_url_path, normalize_url, url_to_output},
};
use chrono::NaiveDateTime;
use pulldown_cmark::{Options, Parser, html as md_html};
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};

static RE_HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\B#(\w+)").unwrap());

/// Why a document produced no page without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyFrontMatter,
    EmptyBody,
    /// Publish date is after build time.
    FutureScheduled,
}

/// Outcome of enriching one document.
#[derive(Debug)]
pub enum Enriched {
    Page {
        page: Page,
        /// Mentioned handles missing from the person-tag directory.
        unresolved: Vec<String>,
    },
    Skipped(SkipReason),
}

/// Read-only inputs shared by every enrichment task.
pub struct EnrichContext<'a> {
    pub config: &'a SiteConfig,
    pub layouts: &'a LayoutCache,
    pub mentions: &'a MentionDirectory,
    pub now: NaiveDateTime,
}

/// Turn one document into a page.
pub fn enrich(doc: &Document, cx: &EnrichContext<'_>) -> Result<Enriched, DocumentError> {
    let Some(fm) = &doc.front_matter else {
        return Ok(Enriched::Skipped(SkipReason::EmptyFrontMatter));
    };
    if doc.body.trim().is_empty() {
        return Ok(Enriched::Skipped(SkipReason::EmptyBody));
    }

    let layout = fm
        .layout
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| {
            DocumentError::MissingMetadata(format!("`{}` has no layout", doc.relative.display()))
        })?;
    cx.layouts.chain(layout)?;

    let categories = merge_categories(fm);
    let is_note = layout.trim_end_matches('s').eq_ignore_ascii_case("note")
        || categories.iter().any(|c| c.eq_ignore_ascii_case("note"));

    let published_at = publish_date(doc, fm, &categories, is_note);
    if published_at.is_some_and(|date| date.0 > cx.now) {
        return Ok(Enriched::Skipped(SkipReason::FutureScheduled));
    }

    // Excerpt comes from the body as written, before mentions are linked
    let pre_html = to_html(&doc.body, doc.format);
    let excerpt = first_paragraph_text(&pre_html)
        .map(|text| strip_markers(&text))
        .unwrap_or_default();
    let meta_description = fm.meta_description.clone().unwrap_or_else(|| {
        match excerpt.split(". ").next() {
            Some(first) if !first.is_empty() => format!("{first}..."),
            _ => String::new(),
        }
    });
    let description = fm.description.clone().unwrap_or_else(|| excerpt.clone());

    let groups: Vec<_> = cx
        .config
        .build
        .groups
        .iter()
        .filter(|g| g.matches(&categories, layout, &doc.directory))
        .collect();

    let expand_mentions = doc.kind == DocumentKind::Post || groups.iter().any(|g| g.mentions);
    let (mut body, unresolved) = if expand_mentions {
        let expansion = cx.mentions.expand(&doc.body, doc.format);
        (to_html(&expansion.text, doc.format), expansion.unresolved)
    } else {
        (pre_html, Vec::new())
    };

    let mut tags = fm.tags.as_ref().map(|t| t.to_vec()).unwrap_or_default();
    if is_note {
        body = link_hashtags(&body, &mut tags);
    }
    dedup_in_order(&mut tags);

    let title = fm
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(&categories, &cx.config.base.author));

    let (url, output) = resolve_url(doc, fm, published_at, &cx.config.build.templates);
    let slug = url
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_owned();

    let images = image_sources(&body);
    let image = fm
        .image
        .as_ref()
        .and_then(|i| i.resolve())
        .or_else(|| images.first().cloned());
    let photo_grid = published_at.is_some() && images.len() > 2;

    let page = Page {
        url,
        output,
        slug,
        title,
        layout: layout.to_owned(),
        kind: doc.kind,
        source: doc.relative.clone(),
        directory: doc.directory.clone(),
        excerpt,
        description,
        meta_description,
        full_date: published_at.map(|d| d.full_date()).unwrap_or_default(),
        published: published_at.map(|d| d.long_date()).unwrap_or_default(),
        date: published_at.map(DateParts::from),
        published_at,
        body,
        categories,
        tags,
        groups: groups.iter().map(|g| g.name.clone()).collect(),
        images,
        image,
        photo_grid,
        is_note,
        interaction: interaction(fm),
        context: fm.context.clone(),
        extra: fm.extra.clone(),
    };

    Ok(Enriched::Page { page, unresolved })
}

/// Render a body to HTML; HTML sources pass through unchanged.
pub fn to_html(source: &str, format: SourceFormat) -> String {
    match format {
        SourceFormat::Html => source.to_owned(),
        SourceFormat::Markdown => {
            let mut options = Options::empty();
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_FOOTNOTES);

            let parser = Parser::new_ext(source, options);
            let mut html = String::with_capacity(source.len() * 3 / 2);
            md_html::push_html(&mut html, parser);
            html
        }
    }
}

fn merge_categories(fm: &FrontMatter) -> Vec<String> {
    let mut categories: Vec<String> = fm
        .categories
        .iter()
        .chain(fm.category.iter())
        .flat_map(|field| field.to_vec())
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect();
    if fm.ate {
        categories.push("Eat".to_owned());
    }
    dedup_in_order(&mut categories);
    categories
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(item.clone());
            true
        }
    });
}

/// Explicit `published` wins; long-form content falls back to the filename.
fn publish_date(
    doc: &Document,
    fm: &FrontMatter,
    categories: &[String],
    is_note: bool,
) -> Option<PublishDate> {
    if let Some(published) = &fm.published {
        let parsed = match published {
            PublishedField::Timestamp(secs) => from_timestamp(*secs),
            PublishedField::Text(text) => parse_date(text),
        };
        if parsed.is_none() {
            log!("warn"; "{}: malformed date {:?}", doc.relative.display(), published);
        }
        return parsed.map(PublishDate);
    }

    let long_form = doc.kind == DocumentKind::Post
        || categories.iter().any(|c| c == "Post")
        || is_note;
    if !long_form {
        return None;
    }

    split_dated_stem(&doc.stem()).and_then(|(date, _)| PublishDate::from_ymd(date))
}

/// `#word` in text nodes becomes a tag link; the words join `tags`.
fn link_hashtags(html: &str, tags: &mut Vec<String>) -> String {
    let text = plain_text(html);
    let found: Vec<String> = RE_HASHTAG
        .captures_iter(&text)
        .map(|caps| caps[1].to_lowercase())
        .collect();
    if found.is_empty() {
        return html.to_owned();
    }
    tags.extend(found);

    replace_in_text(html, &RE_HASHTAG, |caps| {
        let word = &caps[1];
        format!("<a href='/tag/{}/' rel='tag'>#{word}</a>", word.to_lowercase())
    })
}

fn default_title(categories: &[String], author: &str) -> String {
    match categories.last() {
        Some(category) => category
            .replace('-', " ")
            .split_whitespace()
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" "),
        None => format!("Post by {author}"),
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Site url and output file.
fn resolve_url(
    doc: &Document,
    fm: &FrontMatter,
    published_at: Option<PublishDate>,
    template_root: &str,
) -> (String, PathBuf) {
    if let Some(permalink) = fm.permalink.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        let url = normalize_url(permalink);
        let output = if permalink.ends_with(".html") {
            PathBuf::from(permalink.trim_start_matches('/'))
        } else {
            url_to_output(&url)
        };
        return (url, output);
    }

    let url = match (doc.kind, published_at) {
        (DocumentKind::Post, Some(date)) => {
            let stem = doc.stem();
            let slug = split_dated_stem(&stem)
                .map(|(_, slug)| slug.to_owned())
                .filter(|slug| !slug.is_empty())
                .unwrap_or(stem);
            let (year, month, day) = date.ymd();
            format!("/{year}/{month}/{day}/{slug}/")
        }
        _ => normalize_url(&content_url_path(&doc.relative, template_root)),
    };
    let output = url_to_output(&url);
    (url, output)
}

fn interaction(fm: &FrontMatter) -> Option<Interaction> {
    [
        (InteractionKind::Reply, &fm.in_reply_to),
        (InteractionKind::Like, &fm.like_of),
        (InteractionKind::Bookmark, &fm.bookmark_of),
        (InteractionKind::Repost, &fm.repost_of),
    ]
    .into_iter()
    .find_map(|(kind, target)| {
        target.as_ref().map(|t| Interaction {
            kind,
            url: t.url().to_owned(),
        })
    })
}

// ============================================================================
// Tests
// ============================================================================
