//! Append-only index filled by enrichment workers.

use super::{BucketKey, SiteIndex};
use crate::content::{DocumentKind, Page, PageRef};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::{collections::BTreeMap, sync::Arc};

/// Thread-safe bucket map for the enrichment phase.
///
/// Each page takes the write lock once and is pushed onto all of its
/// buckets under it. Append order is unspecified; [`finish`](Self::finish)
/// sorts.
#[derive(Debug, Default)]
pub struct SiteIndexBuilder {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: BTreeMap<BucketKey, Vec<PageRef>>,
    pages: Vec<PageRef>,
}

impl SiteIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page to every bucket it belongs to.
    pub fn insert(&self, page: Page) -> PageRef {
        let keys = bucket_keys(&page);
        let page = Arc::new(page);

        let mut inner = self.inner.write();
        for key in keys {
            inner.buckets.entry(key).or_default().push(Arc::clone(&page));
        }
        inner.pages.push(Arc::clone(&page));
        page
    }

    pub fn len(&self) -> usize {
        self.inner.read().pages.len()
    }

    /// Sort every bucket and freeze the index.
    ///
    /// When several pages write the same output file, the one whose source
    /// path sorts first is kept and the rest are moved to
    /// [`SiteIndex::clashes`].
    pub fn finish(self) -> SiteIndex {
        let Inner { mut buckets, pages } = self.inner.into_inner();
        let (pages, clashes) = split_clashes(pages);

        if !clashes.is_empty() {
            let dropped: FxHashSet<*const Page> = clashes.iter().map(Arc::as_ptr).collect();
            for bucket in buckets.values_mut() {
                bucket.retain(|page| !dropped.contains(&Arc::as_ptr(page)));
            }
            buckets.retain(|_, bucket| !bucket.is_empty());
        }

        SiteIndex::new(buckets, pages, clashes)
    }
}

/// Keep one page per output file, the first by source path.
fn split_clashes(mut pages: Vec<PageRef>) -> (Vec<PageRef>, Vec<PageRef>) {
    pages.sort_by(|a, b| a.output.cmp(&b.output).then_with(|| a.source.cmp(&b.source)));

    let mut kept: Vec<PageRef> = Vec::with_capacity(pages.len());
    let mut clashes = Vec::new();
    for page in pages {
        match kept.last() {
            Some(owner) if owner.output == page.output => clashes.push(page),
            _ => kept.push(page),
        }
    }
    (kept, clashes)
}

/// Buckets for a page: categories, tags, groups, date parts and posts.
fn bucket_keys(page: &Page) -> Vec<BucketKey> {
    let mut keys: Vec<BucketKey> = page
        .categories
        .iter()
        .map(|c| BucketKey::Category(c.clone()))
        .chain(page.tags.iter().map(|t| BucketKey::Tag(t.clone())))
        .chain(page.groups.iter().map(|g| BucketKey::Group(g.clone())))
        .collect();

    let dated_post = page.kind == DocumentKind::Post || page.is_note;
    if dated_post && let Some((year, month, day)) = page.date_keys() {
        keys.push(BucketKey::Year(year));
        keys.push(BucketKey::Month(month));
        keys.push(BucketKey::Day(day));
    }

    if page.kind == DocumentKind::Post {
        keys.push(BucketKey::Posts);
    }

    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::test_page;
    use rayon::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_bucket_keys() {
        let mut page = test_page("/a/", "2024-03-01", &["Coffee"]);
        page.tags = vec!["v60".into()];
        page.groups = vec!["notes".into()];

        let keys = bucket_keys(&page);
        assert!(keys.contains(&BucketKey::Category("Coffee".into())));
        assert!(keys.contains(&BucketKey::Tag("v60".into())));
        assert!(keys.contains(&BucketKey::Group("notes".into())));
        assert!(keys.contains(&BucketKey::Year("2024".into())));
        assert!(keys.contains(&BucketKey::Month("2024-03".into())));
        assert!(keys.contains(&BucketKey::Day("2024-03-01".into())));
        assert!(keys.contains(&BucketKey::Posts));
    }

    #[test]
    fn test_undated_page_has_no_date_buckets() {
        let mut page = test_page("/about/", "", &[]);
        page.kind = DocumentKind::Page;
        assert!(bucket_keys(&page).is_empty());
    }

    #[test]
    fn test_duplicate_category_counted_once() {
        let page = test_page("/a/", "2024-03-01", &["X", "X"]);
        let index = {
            let builder = SiteIndexBuilder::new();
            builder.insert(page);
            builder.finish()
        };
        assert_eq!(index.category("X").len(), 1);
    }

    #[test]
    fn test_output_clash_keeps_first_source() {
        let mut markdown = test_page("/2024/03/01/a/", "2024-03-01", &["Coffee"]);
        markdown.source = "_posts/2024-03-01-a.md".into();
        let mut html = test_page("/2024/03/01/a/", "2024-03-01", &["Tea"]);
        html.source = "_posts/2024-03-01-a.html".into();

        for order in [[html.clone(), markdown.clone()], [markdown.clone(), html.clone()]] {
            let builder = SiteIndexBuilder::new();
            for page in order {
                builder.insert(page);
            }
            let index = builder.finish();

            assert_eq!(index.len(), 1);
            assert_eq!(index.pages()[0].source, PathBuf::from("_posts/2024-03-01-a.html"));
            assert_eq!(index.clashes().len(), 1);
            assert_eq!(index.clashes()[0].source, PathBuf::from("_posts/2024-03-01-a.md"));
            assert!(index.category("Coffee").is_empty());
            assert!(index.categories().all(|(name, _)| name != "Coffee"));
            assert_eq!(index.category("Tea").len(), 1);
            assert_eq!(index.posts().len(), 1);
        }
    }

    #[test]
    fn test_concurrent_inserts() {
        let builder = SiteIndexBuilder::new();
        (0..200).into_par_iter().for_each(|i| {
            let day = 1 + i % 28;
            builder.insert(test_page(&format!("/p{i}/"), &format!("2024-02-{day:02}"), &["Shared"]));
        });
        assert_eq!(builder.len(), 200);

        let index = builder.finish();
        let shared = index.category("Shared");
        assert_eq!(shared.len(), 200);
        assert!(shared.windows(2).all(|w| w[0].full_date >= w[1].full_date));
    }
}
