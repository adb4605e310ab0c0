//! Site index: enriched pages grouped into buckets.
//!
//! Two phases, two types:
//!
//! | Phase      | Type               | Access                                  |
//! |------------|--------------------|-----------------------------------------|
//! | enrichment | `SiteIndexBuilder` | shared by workers, appends under a lock |
//! | everything | `SiteIndex`        | immutable, every bucket sorted          |
//!
//! `SiteIndexBuilder::finish` consumes the builder, so no stage can observe
//! a half-filled or unsorted bucket.

mod builder;

pub use builder::SiteIndexBuilder;

use crate::content::{DocumentKind, PageRef};
use std::{cmp::Ordering, collections::BTreeMap};

/// Category a stream excludes notes from.
const STREAM_EXCLUDED: &[&str] = &["Activity", "Eat"];

/// One bucket of the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Category(String),
    Tag(String),
    Group(String),
    /// `YYYY`
    Year(String),
    /// `YYYY-MM`
    Month(String),
    /// `YYYY-MM-DD`
    Day(String),
    /// Every `Post`-kind page.
    Posts,
}

/// Newest first; ties and undated pages ordered by url.
pub(crate) fn by_date_desc(a: &PageRef, b: &PageRef) -> Ordering {
    b.full_date
        .cmp(&a.full_date)
        .then_with(|| a.url.cmp(&b.url))
}

/// Finalized, read-only index.
#[derive(Debug, Default)]
pub struct SiteIndex {
    buckets: BTreeMap<BucketKey, Vec<PageRef>>,
    /// Every indexed page, sorted.
    pages: Vec<PageRef>,
    stream: Vec<PageRef>,
    clashes: Vec<PageRef>,
}

impl SiteIndex {
    fn new(
        mut buckets: BTreeMap<BucketKey, Vec<PageRef>>,
        mut pages: Vec<PageRef>,
        clashes: Vec<PageRef>,
    ) -> Self {
        for bucket in buckets.values_mut() {
            bucket.sort_by(by_date_desc);
        }
        pages.sort_by(by_date_desc);

        let mut stream: Vec<PageRef> = pages
            .iter()
            .filter(|p| {
                p.kind == DocumentKind::Post
                    || (p.is_note
                        && !p
                            .categories
                            .iter()
                            .any(|c| STREAM_EXCLUDED.contains(&c.as_str())))
            })
            .cloned()
            .collect();
        stream.dedup_by(|a, b| a.url == b.url);

        Self {
            buckets,
            pages,
            stream,
            clashes,
        }
    }

    pub fn bucket(&self, key: &BucketKey) -> &[PageRef] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn category(&self, name: &str) -> &[PageRef] {
        self.bucket(&BucketKey::Category(name.to_owned()))
    }

    pub fn tag(&self, name: &str) -> &[PageRef] {
        self.bucket(&BucketKey::Tag(name.to_owned()))
    }

    pub fn group(&self, name: &str) -> &[PageRef] {
        self.bucket(&BucketKey::Group(name.to_owned()))
    }

    pub fn posts(&self) -> &[PageRef] {
        self.bucket(&BucketKey::Posts)
    }

    /// Posts plus notes, minus activity and food notes.
    pub fn stream(&self) -> &[PageRef] {
        &self.stream
    }

    /// Every indexed page, newest first.
    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Pages dropped because an earlier source owns the same output file.
    pub fn clashes(&self) -> &[PageRef] {
        &self.clashes
    }

    fn names<'a>(
        &'a self,
        select: impl Fn(&'a BucketKey) -> Option<&'a str> + 'a,
    ) -> impl Iterator<Item = (&'a str, &'a [PageRef])> + 'a {
        self.buckets
            .iter()
            .filter_map(move |(key, pages)| select(key).map(|name| (name, pages.as_slice())))
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[PageRef])> {
        self.names(|k| match k {
            BucketKey::Category(n) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &[PageRef])> {
        self.names(|k| match k {
            BucketKey::Tag(n) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[PageRef])> {
        self.names(|k| match k {
            BucketKey::Group(n) => Some(n.as_str()),
            _ => None,
        })
    }

    /// Years with content, newest first.
    pub fn years(&self) -> Vec<&str> {
        let mut years: Vec<&str> = self
            .names(|k| match k {
                BucketKey::Year(y) => Some(y.as_str()),
                _ => None,
            })
            .map(|(y, _)| y)
            .collect();
        years.reverse();
        years
    }

    /// `YYYY-MM` months with content, newest first.
    pub fn months(&self) -> Vec<&str> {
        let mut months: Vec<&str> = self
            .names(|k| match k {
                BucketKey::Month(m) => Some(m.as_str()),
                _ => None,
            })
            .map(|(m, _)| m)
            .collect();
        months.reverse();
        months
    }

    /// Older and newer neighbours of a post.
    pub fn neighbours(&self, url: &str) -> (Option<&PageRef>, Option<&PageRef>) {
        let posts = self.posts();
        match posts.iter().position(|p| p.url == url) {
            Some(i) => (posts.get(i + 1), i.checked_sub(1).and_then(|j| posts.get(j))),
            None => (None, None),
        }
    }
}
