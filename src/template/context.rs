//! Template context assembly.
//!
//! The `site` variable comes in two tiers, serialized once per build:
//!
//! | Tier  | Who gets it                      | Buckets hold            |
//! |-------|----------------------------------|-------------------------|
//! | light | posts, group members             | page counts             |
//! | full  | other pages, archives, the index | page lists, posts, stream |
//!
//! Both tiers carry `[base]` fields, `extra`, `years` and `months`.

use crate::config::SiteConfig;
use crate::content::{DocumentKind, MentionDirectory, Page, PageRef};
use crate::index::SiteIndex;
use crate::utils::slug::bucket_slug;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tera::Context;

/// Series listings show this many posts.
const SERIES_PREVIEW: usize = 10;
const SERIES_MARKER: &str = "(Series)";

/// Prebuilt base contexts, cloned per render.
pub struct SiteContext {
    light: Context,
    full: Context,
}

impl SiteContext {
    pub fn new(config: &SiteConfig, index: &SiteIndex, mentions: &MentionDirectory) -> Self {
        let light = base_context(snapshot(config, index, false), mentions);
        let full = base_context(snapshot(config, index, true), mentions);
        Self { light, full }
    }

    /// Context with the full snapshot and no page.
    pub fn full(&self) -> Context {
        self.full.clone()
    }

    /// Context for rendering one document.
    pub fn for_page(&self, page: &Page, index: &SiteIndex) -> Context {
        let mut context = if page.kind == DocumentKind::Post || !page.groups.is_empty() {
            self.light.clone()
        } else {
            self.full.clone()
        };
        context.insert("page", page);

        if page.kind == DocumentKind::Post {
            let (older, newer) = index.neighbours(&page.url);
            context.insert("previous", &older.map(|p| link(p)));
            context.insert("next", &newer.map(|p| link(p)));
        }

        if let Some(series) = series(page, index) {
            context.insert("series", &series);
        }

        context
    }
}

fn base_context(site: Value, mentions: &MentionDirectory) -> Context {
    let mut context = Context::new();
    context.insert("site", &site);
    context.insert("person_tags", mentions);
    context
}

/// The `site` value for one tier.
fn snapshot(config: &SiteConfig, index: &SiteIndex, full: bool) -> Value {
    let mut site = match serde_json::to_value(&config.base) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    site.insert("url".into(), Value::String(config.base_url().to_owned()));
    site.insert("extra".into(), json!(config.extra));
    site.insert("years".into(), json!(index.years()));
    site.insert("months".into(), json!(index.months()));

    let render = |pages: &[PageRef]| -> Value {
        if full {
            json!(pages.iter().map(|p| p.as_ref()).collect::<Vec<&Page>>())
        } else {
            json!(pages.len())
        }
    };

    site.insert("categories".into(), collect(index.categories(), &render));
    site.insert("tags".into(), collect(index.tags(), &render));
    site.insert("groups".into(), collect(index.groups(), &render));
    site.insert("posts".into(), render(index.posts()));
    site.insert("stream".into(), render(index.stream()));

    Value::Object(site)
}

fn collect<'a>(
    buckets: impl Iterator<Item = (&'a str, &'a [PageRef])>,
    render: &impl Fn(&[PageRef]) -> Value,
) -> Value {
    Value::Object(
        buckets
            .map(|(name, pages)| (name.to_owned(), render(pages)))
            .collect(),
    )
}

#[derive(Debug, Serialize)]
struct Link<'a> {
    title: &'a str,
    url: &'a str,
}

fn link(page: &Page) -> Link<'_> {
    Link {
        title: page.display_title(),
        url: &page.url,
    }
}

#[derive(Debug, Serialize)]
struct Series<'a> {
    name: &'a str,
    slug: String,
    url: String,
    posts: Vec<&'a Page>,
    more: bool,
}

/// Summary of the first `(Series)` category a page belongs to.
fn series<'a>(page: &'a Page, index: &'a SiteIndex) -> Option<Series<'a>> {
    let name = page.categories.iter().find(|c| c.contains(SERIES_MARKER))?;
    let members = index.category(name);
    let slug = bucket_slug(name);

    Some(Series {
        name,
        url: format!("/category/{slug}/"),
        slug,
        posts: members.iter().take(SERIES_PREVIEW).map(|p| p.as_ref()).collect(),
        more: members.len() > SERIES_PREVIEW,
    })
}
