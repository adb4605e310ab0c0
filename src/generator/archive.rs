//! Archive and pagination pages.
//!
//! | Family        | Url                                  | Switch         |
//! |---------------|--------------------------------------|----------------|
//! | category      | `/category/<slug>/`, `/.../<k>/`     | `category`     |
//! | tag           | `/tag/<slug>/`, `/.../<k>/`          | `tag`          |
//! | group         | `/<group>/`, `/<group>/<k>/`         | `list_page`    |
//! | year / month  | `/YYYY/`, `/YYYY/MM/` (single page)  | `date_archive` |
//! | archive index | `/archive/`                          | `date_archive` |
//!
//! Page 1 of a bucket lives at the bucket root; there is no `/1/`.
//! Buckets whose names share a slug (`Coffee`, `coffee`) are merged into
//! one listing, and every url is planned at most once.

use super::write_html;
use crate::config::{AutoGenerate, SiteConfig};
use crate::content::{Page, PageRef};
use crate::error::RenderError;
use crate::index::{BucketKey, SiteIndex, by_date_desc};
use crate::log;
use crate::logger::ProgressBars;
use crate::template::{LayoutCache, SiteContext, TemplateResolver};
use crate::utils::slug::{bucket_slug, normalize_url, url_to_output};
use chrono::NaiveDate;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::{
    borrow::Cow,
    collections::{BTreeMap, btree_map::Entry},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Pagination
// ============================================================================

/// Navigation state for one page of a paginated bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginator {
    /// 1-based page number.
    pub page: usize,
    /// Number of pages.
    pub total: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Url of page `k` of the bucket rooted at `base` (`/category/x/`).
pub fn page_url(base: &str, k: usize) -> String {
    if k <= 1 {
        base.to_owned()
    } else {
        format!("{base}{k}/")
    }
}

/// Split a sorted bucket into pages of `per_page`.
///
/// An empty bucket yields no pages.
pub fn paginate<'a>(
    pages: &'a [PageRef],
    per_page: usize,
    base: &str,
) -> Vec<(Paginator, &'a [PageRef])> {
    let per_page = per_page.max(1);
    let total = pages.len().div_ceil(per_page);

    pages
        .chunks(per_page)
        .enumerate()
        .map(|(i, chunk)| {
            let k = i + 1;
            let paginator = Paginator {
                page: k,
                total,
                per_page,
                total_items: pages.len(),
                previous: (k > 1).then(|| page_url(base, k - 1)),
                next: (k < total).then(|| page_url(base, k + 1)),
            };
            (paginator, chunk)
        })
        .collect()
}

// ============================================================================
// Planning
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Category,
    Tag,
    Group,
    Year,
    Month,
    Index,
}

/// One archive page to render.
#[derive(Debug)]
pub struct ArchiveJob<'a> {
    pub kind: ArchiveKind,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub layout: String,
    pub posts: Cow<'a, [PageRef]>,
    pub paginator: Option<Paginator>,
    pub archive: Vec<YearEntry>,
}

/// A year in the archive index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub year: String,
    pub url: String,
    pub count: usize,
    pub months: Vec<MonthEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthEntry {
    /// `03`
    pub month: String,
    /// `March`
    pub name: String,
    pub url: String,
    pub count: usize,
}

/// The `page` value archive layouts see.
#[derive(Serialize)]
struct ArchivePage<'a> {
    title: &'a str,
    kind: ArchiveKind,
    name: &'a str,
    slug: &'a str,
    url: &'a str,
    posts: Vec<&'a Page>,
    archive: &'a [YearEntry],
}

/// Plan every archive page the configuration enables.
///
/// Families whose layout is missing are skipped with a log line. An archive
/// whose url is already taken by a document is dropped; documents win.
pub fn plan<'a>(
    config: &SiteConfig,
    index: &'a SiteIndex,
    layouts: &LayoutCache,
    taken: &FxHashSet<String>,
) -> Vec<ArchiveJob<'a>> {
    let build = &config.build;
    let per_page = build.per_page;
    let mut jobs = Vec::new();

    let archive_layout = build.archive.layout.as_str();
    let has_archive_layout = usable(layouts, archive_layout);

    let paged = |jobs: &mut Vec<ArchiveJob<'a>>,
                     kind: ArchiveKind,
                     name: &str,
                     base: String,
                     layout: &str,
                     pages: Cow<'a, [PageRef]>| {
        let slug = base.trim_matches('/').rsplit('/').next().unwrap_or_default().to_owned();
        let chunks: Vec<(Paginator, Cow<'a, [PageRef]>)> = match pages {
            Cow::Borrowed(all) => paginate(all, per_page, &base)
                .into_iter()
                .map(|(paginator, chunk)| (paginator, Cow::Borrowed(chunk)))
                .collect(),
            Cow::Owned(all) => paginate(&all, per_page, &base)
                .into_iter()
                .map(|(paginator, chunk)| (paginator, Cow::Owned(chunk.to_vec())))
                .collect(),
        };
        for (paginator, posts) in chunks {
            jobs.push(ArchiveJob {
                kind,
                name: name.to_owned(),
                slug: slug.clone(),
                url: page_url(&base, paginator.page),
                layout: layout.to_owned(),
                posts,
                paginator: Some(paginator),
                archive: Vec::new(),
            });
        }
    };

    let families = [
        (AutoGenerate::Category, ArchiveKind::Category, "category"),
        (AutoGenerate::Tag, ArchiveKind::Tag, "tag"),
    ];
    for (switch, kind, prefix) in families {
        if !build.generates(switch) {
            continue;
        }
        if !has_archive_layout {
            log!("archive"; "no `{archive_layout}` layout, {prefix} pages skipped");
            continue;
        }
        let buckets: Vec<_> = match kind {
            ArchiveKind::Category => index.categories().collect(),
            _ => index.tags().collect(),
        };
        for (slug, (name, pages)) in merge_by_slug(buckets) {
            paged(&mut jobs, kind, name, format!("/{prefix}/{slug}/"), archive_layout, pages);
        }
    }

    if build.generates(AutoGenerate::ListPage) {
        for group in &build.groups {
            let pages = index.group(&group.name);
            if pages.is_empty() {
                continue;
            }
            let layout = if usable(layouts, &group.name) {
                group.name.as_str()
            } else if has_archive_layout {
                archive_layout
            } else {
                log!("archive"; "no layout for group `{}`, skipped", group.name);
                continue;
            };
            let base = normalize_url(&bucket_slug(&group.name));
            paged(&mut jobs, ArchiveKind::Group, &group.name, base, layout, Cow::Borrowed(pages));
        }
    }

    if build.generates(AutoGenerate::DateArchive) {
        plan_dates(config, index, layouts, &mut jobs);
    }

    let mut planned = FxHashSet::default();
    jobs.retain(|job| {
        if taken.contains(&job.url) {
            log!("archive"; "{} is a document url, archive page skipped", job.url);
            return false;
        }
        if !planned.insert(job.url.clone()) {
            log!("archive"; "{} already planned, {:?} `{}` skipped", job.url, job.kind, job.name);
            return false;
        }
        true
    });
    jobs
}

/// Group buckets by slug, in slug order.
///
/// The first name in key order names a merged bucket. Merged pages are
/// re-sorted and a page found in several of the buckets is listed once.
fn merge_by_slug<'a>(
    buckets: Vec<(&'a str, &'a [PageRef])>,
) -> BTreeMap<String, (&'a str, Cow<'a, [PageRef]>)> {
    let mut merged: BTreeMap<String, (&'a str, Cow<'a, [PageRef]>)> = BTreeMap::new();

    for (name, pages) in buckets {
        let slug = bucket_slug(name);
        if slug.is_empty() {
            continue;
        }
        match merged.entry(slug) {
            Entry::Vacant(entry) => {
                entry.insert((name, Cow::Borrowed(pages)));
            }
            Entry::Occupied(mut entry) => {
                log!("archive"; "`{name}` shares slug `{}` with `{}`, merged", entry.key(), entry.get().0);
                let combined = entry.get_mut().1.to_mut();
                combined.extend(pages.iter().cloned());
                combined.sort_by(by_date_desc);
                combined.dedup_by(|a, b| Arc::ptr_eq(a, b));
            }
        }
    }
    merged
}

fn plan_dates<'a>(
    config: &SiteConfig,
    index: &'a SiteIndex,
    layouts: &LayoutCache,
    jobs: &mut Vec<ArchiveJob<'a>>,
) {
    let archive = &config.build.archive;

    if usable(layouts, &archive.layout) {
        for year in index.years() {
            let pages = index.bucket(&BucketKey::Year(year.to_owned()));
            jobs.push(single(ArchiveKind::Year, year, year, format!("/{year}/"), &archive.layout, pages));
        }
        for month in index.months() {
            let pages = index.bucket(&BucketKey::Month(month.to_owned()));
            let Some((year, mm)) = month.split_once('-') else {
                continue;
            };
            let name = format!("{} {year}", month_name(year, mm));
            jobs.push(single(ArchiveKind::Month, &name, mm, format!("/{year}/{mm}/"), &archive.layout, pages));
        }
    } else {
        log!("archive"; "no `{}` layout, date archives skipped", archive.layout);
    }

    if usable(layouts, &archive.index_layout) {
        let url = normalize_url(&archive.index_path);
        let mut job = single(ArchiveKind::Index, "Archive", &bucket_slug(&archive.index_path), url, &archive.index_layout, &[]);
        job.archive = archive_entries(index);
        jobs.push(job);
    } else {
        log!("archive"; "no `{}` layout, archive index skipped", archive.index_layout);
    }
}

fn single<'a>(
    kind: ArchiveKind,
    name: &str,
    slug: &str,
    url: String,
    layout: &str,
    posts: &'a [PageRef],
) -> ArchiveJob<'a> {
    ArchiveJob {
        kind,
        name: name.to_owned(),
        slug: slug.to_owned(),
        url,
        layout: layout.to_owned(),
        posts: Cow::Borrowed(posts),
        paginator: None,
        archive: Vec::new(),
    }
}

/// Every year with its months, newest first.
fn archive_entries(index: &SiteIndex) -> Vec<YearEntry> {
    let months = index.months();
    index
        .years()
        .into_iter()
        .map(|year| YearEntry {
            year: year.to_owned(),
            url: format!("/{year}/"),
            count: index.bucket(&BucketKey::Year(year.to_owned())).len(),
            months: months
                .iter()
                .filter_map(|m| m.strip_prefix(year)?.strip_prefix('-').map(|mm| (*m, mm)))
                .map(|(key, mm)| MonthEntry {
                    month: mm.to_owned(),
                    name: month_name(year, mm),
                    url: format!("/{year}/{mm}/"),
                    count: index.bucket(&BucketKey::Month(key.to_owned())).len(),
                })
                .collect(),
        })
        .collect()
}

/// Present and with a terminating chain.
fn usable(layouts: &LayoutCache, name: &str) -> bool {
    layouts.contains(name) && !layouts.is_cyclic(name)
}

fn month_name(year: &str, mm: &str) -> String {
    year.parse::<i32>()
        .ok()
        .zip(mm.parse::<u32>().ok())
        .and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        .map(|d| d.format("%B").to_string())
        .unwrap_or_else(|| mm.to_owned())
}

// ============================================================================
// Rendering
// ============================================================================

/// Outcome of rendering every planned archive page.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// Urls written, in plan order.
    pub written: Vec<String>,
    pub failures: usize,
}

/// Render and write archive pages on the current rayon pool.
pub fn generate(
    jobs: &[ArchiveJob<'_>],
    config: &SiteConfig,
    resolver: TemplateResolver<'_>,
    site: &SiteContext,
    progress: Option<&ProgressBars>,
) -> ArchiveReport {
    let failures = AtomicUsize::new(0);

    let written: Vec<Option<String>> = jobs
        .par_iter()
        .map(|job| {
            let result = render(job, resolver, site)
                .and_then(|html| write_html(config, &url_to_output(&job.url), &html));
            if let Some(progress) = progress {
                progress.inc("archive");
            }
            match result {
                Ok(()) => Some(job.url.clone()),
                Err(e) => {
                    log!("error"; "{}: {}", job.url, e);
                    failures.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();

    ArchiveReport {
        written: written.into_iter().flatten().collect(),
        failures: failures.into_inner(),
    }
}

fn render(
    job: &ArchiveJob<'_>,
    resolver: TemplateResolver<'_>,
    site: &SiteContext,
) -> Result<String, RenderError> {
    let page = ArchivePage {
        title: &job.name,
        kind: job.kind,
        name: &job.name,
        slug: &job.slug,
        url: &job.url,
        posts: job.posts.iter().map(|p| p.as_ref()).collect(),
        archive: &job.archive,
    };

    let mut context = site.full();
    context.insert("page", &page);
    if let Some(paginator) = &job.paginator {
        context.insert("paginator", paginator);
    }

    resolver.render_layout(&job.layout, String::new(), context)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::test_page;
    use crate::index::SiteIndexBuilder;

    fn pages(n: usize) -> Vec<PageRef> {
        let builder = SiteIndexBuilder::new();
        for i in 0..n {
            builder.insert(test_page(
                &format!("/p{i:02}/"),
                &format!("2024-01-{:02}", 1 + i % 28),
                &["Coffee (Series)"],
            ));
        }
        builder.finish().category("Coffee (Series)").to_vec()
    }

    fn layouts(names: &[&str]) -> LayoutCache {
        let sources = names.iter().map(|n| (n.to_string(), "{{ page.title }}".to_string())).collect();
        LayoutCache::from_sources(sources, vec![], "default", None).unwrap()
    }

    #[test]
    fn test_paginate_23() {
        let pages = pages(23);
        let result = paginate(&pages, 10, "/category/coffee-series/");

        assert_eq!(result.len(), 3);
        assert_eq!(
            result.iter().map(|(_, chunk)| chunk.len()).collect::<Vec<_>>(),
            vec![10, 10, 3]
        );

        let (first, chunk) = &result[0];
        assert_eq!(first.previous, None);
        assert_eq!(first.next.as_deref(), Some("/category/coffee-series/2/"));
        assert_eq!(first.total, 3);
        assert!(Arc::ptr_eq(&chunk[0], &pages[0]));

        let (second, chunk) = &result[1];
        assert_eq!(second.previous.as_deref(), Some("/category/coffee-series/"));
        assert_eq!(second.next.as_deref(), Some("/category/coffee-series/3/"));
        assert!(Arc::ptr_eq(&chunk[0], &pages[10]));

        let (third, _) = &result[2];
        assert_eq!(third.previous.as_deref(), Some("/category/coffee-series/2/"));
        assert_eq!(third.next, None);
    }

    #[test]
    fn test_paginate_exact_and_empty() {
        assert_eq!(paginate(&pages(10), 10, "/x/").len(), 1);
        assert!(paginate(&[], 10, "/x/").is_empty());
    }

    #[test]
    fn test_page_url() {
        assert_eq!(page_url("/tag/v60/", 1), "/tag/v60/");
        assert_eq!(page_url("/tag/v60/", 4), "/tag/v60/4/");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name("2024", "03"), "March");
        assert_eq!(month_name("2024", "xx"), "xx");
    }

    fn index() -> SiteIndex {
        let builder = SiteIndexBuilder::new();
        for i in 0..12 {
            let mut page = test_page(&format!("/p{i}/"), &format!("2024-0{}-01", 1 + i % 2), &["Coffee (Series)"]);
            page.tags = vec!["v60".into()];
            page.groups = vec!["likes".into()];
            builder.insert(page);
        }
        builder.finish()
    }

    #[test]
    fn test_plan_families() {
        let config = SiteConfig::default();
        let index = index();
        let jobs = plan(&config, &index, &layouts(&["category", "archive"]), &FxHashSet::default());

        let urls: Vec<_> = jobs.iter().map(|j| j.url.as_str()).collect();
        assert!(urls.contains(&"/category/coffee-series/"));
        assert!(urls.contains(&"/category/coffee-series/2/"));
        assert!(urls.contains(&"/tag/v60/"));
        assert!(urls.contains(&"/likes/"));
        assert!(urls.contains(&"/2024/"));
        assert!(urls.contains(&"/2024/01/"));
        assert!(urls.contains(&"/2024/02/"));
        assert!(urls.contains(&"/archive/"));

        let index_job = jobs.iter().find(|j| j.kind == ArchiveKind::Index).unwrap();
        assert_eq!(index_job.layout, "archive");
        assert_eq!(index_job.archive.len(), 1);
        assert_eq!(index_job.archive[0].months.len(), 2);
        assert_eq!(index_job.archive[0].months[0].name, "February");
    }

    #[test]
    fn test_plan_respects_switches_and_layouts() {
        let mut config = SiteConfig::default();
        config.build.auto_generate = vec![AutoGenerate::Tag];
        let index = index();

        let jobs = plan(&config, &index, &layouts(&["category"]), &FxHashSet::default());
        assert!(jobs.iter().all(|j| j.kind == ArchiveKind::Tag));

        let jobs = plan(&config, &index, &layouts(&["default"]), &FxHashSet::default());
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_group_uses_own_layout() {
        let config = SiteConfig::default();
        let index = index();
        let jobs = plan(&config, &index, &layouts(&["category", "likes"]), &FxHashSet::default());

        let likes = jobs.iter().find(|j| j.url == "/likes/").unwrap();
        assert_eq!(likes.layout, "likes");
        assert_eq!(likes.kind, ArchiveKind::Group);
    }

    #[test]
    fn test_colliding_tag_slugs_merged() {
        let builder = SiteIndexBuilder::new();
        let mut a = test_page("/2024/03/01/a/", "2024-03-01", &[]);
        a.tags = vec!["Coffee".into()];
        let mut b = test_page("/2024/03/02/b/", "2024-03-02", &[]);
        b.tags = vec!["coffee".into()];
        let mut c = test_page("/2024/03/03/c/", "2024-03-03", &[]);
        c.tags = vec!["Coffee".into(), "coffee".into()];
        for page in [a, b, c] {
            builder.insert(page);
        }
        let index = builder.finish();

        let mut config = SiteConfig::default();
        config.build.auto_generate = vec![AutoGenerate::Tag];
        let jobs = plan(&config, &index, &layouts(&["category"]), &FxHashSet::default());

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.url, "/tag/coffee/");
        assert_eq!(job.name, "Coffee");
        let urls: Vec<_> = job.posts.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/2024/03/03/c/", "/2024/03/02/b/", "/2024/03/01/a/"]);
        assert_eq!(job.paginator.as_ref().unwrap().total_items, 3);
    }

    #[test]
    fn test_duplicate_urls_planned_once() {
        let mut config = SiteConfig::default();
        config.build.groups.push(crate::config::GroupConfig {
            name: "2024".into(),
            category: Some("Coffee (Series)".into()),
            layout: None,
            directory: None,
            mentions: false,
        });
        let builder = SiteIndexBuilder::new();
        let mut page = test_page("/p/", "2024-01-01", &["Coffee (Series)"]);
        page.groups = vec!["2024".into()];
        builder.insert(page);
        let index = builder.finish();

        let jobs = plan(&config, &index, &layouts(&["category"]), &FxHashSet::default());
        let year_urls = jobs.iter().filter(|j| j.url == "/2024/").count();
        assert_eq!(year_urls, 1);
    }

    #[test]
    fn test_document_urls_win() {
        let config = SiteConfig::default();
        let index = index();
        let taken: FxHashSet<String> = ["/likes/".to_string()].into_iter().collect();
        let jobs = plan(&config, &index, &layouts(&["category"]), &taken);
        assert!(!jobs.iter().any(|j| j.url == "/likes/"));
    }
}
