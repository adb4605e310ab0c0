//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── LayoutCache::load / MentionDirectory::load / scan   (abort on failure)
//!     │
//!     └── rayon pool (build.workers)
//!             │
//!             ├── enrich_all()      Document ─► Page ─► SiteIndexBuilder
//!             │                     finish() ─► SiteIndex (sorted, immutable)
//!             │
//!             ├── render_pages()    page body + layout chain ─► index.html
//!             ├── archive           plan ─► paginate ─► index.html
//!             ├── feed              jf2 / json / rss files
//!             └── sitemap           sitemap.xml
//! ```
//!
//! Per-document failures are logged and counted; only a missing global
//! resource aborts the build. The caller decides the exit status from
//! [`BuildReport::failures`].

use crate::{
    config::SiteConfig,
    content::{self, Document, EnrichContext, Enriched, MentionDirectory, SkipReason, enrich},
    error::SetupError,
    generator::{archive, feed, sitemap::build_sitemap, write_html},
    index::{SiteIndex, SiteIndexBuilder},
    log,
    logger::ProgressBars,
    template::{LayoutCache, SiteContext, TemplateResolver},
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

/// Counts from one build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Document pages written.
    pub pages: usize,
    /// Archive pages written, including the archive index.
    pub archives: usize,
    /// Feed files written.
    pub feeds: usize,
    pub skipped_future: usize,
    /// Documents with empty front matter or an empty body.
    pub skipped_empty: usize,
    /// Documents, pages, archives and feeds that failed.
    pub failures: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Build the whole site as of `now`.
pub fn build_site(config: &SiteConfig, now: NaiveDateTime) -> Result<BuildReport> {
    let started = Instant::now();
    let build = &config.build;

    // ========================================================================
    // Global resources
    // ========================================================================
    if !build.content.is_dir() {
        return Err(SetupError::MissingContent(build.content.clone()).into());
    }
    let layouts = LayoutCache::load(
        &build.layouts,
        &build.includes,
        &build.default_layout,
        build.layout_variant.as_deref(),
    )?;
    let mentions = MentionDirectory::load(&build.person_tags)?;
    prepare_output(&build.output, build.clean)?;

    let paths = content::scan(config)?;
    log!(
        "content";
        "{} documents, {} layouts, {} person tags",
        paths.len(),
        layouts.len(),
        mentions.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(build.workers)
        .build()
        .map_err(|e| SetupError::Pool(e.to_string()))?;

    let (mut report, pending) = pool.install(|| {
        let collected = enrich_all(config, &layouts, &mentions, &paths, now);
        let Collected { index, pending, .. } = &collected;

        let site = SiteContext::new(config, index, &mentions);
        let resolver = TemplateResolver::new(&layouts);

        let pages = render_pages(config, index, resolver, &site);

        let taken: FxHashSet<String> = index.pages().iter().map(|p| p.url.clone()).collect();
        let jobs = archive::plan(config, index, &layouts, &taken);
        let progress = ProgressBars::new_filtered(&[("archive", jobs.len())]);
        let archives = archive::generate(&jobs, config, resolver, &site, progress.as_ref());
        drop(progress);

        let feeds = feed::emit(config, index);

        let mut urls: Vec<String> = pages.written.clone();
        urls.extend(archives.written.iter().cloned());
        let sitemap_failed = match build_sitemap(config, &urls, now.date()) {
            Ok(_) => 0,
            Err(e) => {
                log!("error"; "sitemap: {e:#}");
                1
            }
        };

        let report = BuildReport {
            pages: pages.written.len(),
            archives: archives.written.len(),
            feeds: feeds.written.len(),
            skipped_future: collected.skipped_future,
            skipped_empty: collected.skipped_empty,
            failures: collected.failures
                + pages.failures
                + archives.failures
                + feeds.failures
                + sitemap_failed,
            elapsed: Duration::ZERO,
        };
        (report, pending.clone())
    });

    let pending_path = pending_path(&build.person_tags);
    content::mention::write_pending(&pending_path, &pending)?;
    if !pending.is_empty() {
        log!("mention"; "{} unknown handles in {}", pending.len(), pending_path.display());
    }

    report.elapsed = started.elapsed();
    log_summary(&report);
    Ok(report)
}

// ============================================================================
// Enrichment
// ============================================================================

/// Result of the enrichment stage.
struct Collected {
    index: SiteIndex,
    /// Mentioned handles missing from the person-tag directory.
    pending: BTreeSet<String>,
    skipped_future: usize,
    skipped_empty: usize,
    failures: usize,
}

/// Load and enrich every document in parallel, then freeze the index.
fn enrich_all(
    config: &SiteConfig,
    layouts: &LayoutCache,
    mentions: &MentionDirectory,
    paths: &[PathBuf],
    now: NaiveDateTime,
) -> Collected {
    let cx = EnrichContext {
        config,
        layouts,
        mentions,
        now,
    };
    let builder = SiteIndexBuilder::new();
    let pending = Mutex::new(BTreeSet::new());
    let skipped_future = AtomicUsize::new(0);
    let skipped_empty = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);

    paths.par_iter().for_each(|path| {
        let result = Document::load(path, &config.build.content, &config.build.posts)
            .and_then(|doc| enrich(&doc, &cx));

        match result {
            Ok(Enriched::Page { page, unresolved }) => {
                builder.insert(page);
                if !unresolved.is_empty() {
                    pending.lock().extend(unresolved);
                }
            }
            Ok(Enriched::Skipped(SkipReason::FutureScheduled)) => {
                skipped_future.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Enriched::Skipped(_)) => {
                skipped_empty.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let relative = path.strip_prefix(&config.build.content).unwrap_or(path);
                log!("error"; "{}: {e}", relative.display());
                failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let index = builder.finish();
    for clash in index.clashes() {
        log!("error"; "{}: output {} already written by another document", clash.source.display(), clash.output.display());
    }

    Collected {
        pending: pending.into_inner(),
        skipped_future: skipped_future.into_inner(),
        skipped_empty: skipped_empty.into_inner(),
        failures: failures.into_inner() + index.clashes().len(),
        index,
    }
}

// ============================================================================
// Rendering
// ============================================================================

struct Rendered {
    /// Urls written, in index order.
    written: Vec<String>,
    failures: usize,
}

/// Render every indexed page through its layout chain and write it.
fn render_pages(
    config: &SiteConfig,
    index: &SiteIndex,
    resolver: TemplateResolver<'_>,
    site: &SiteContext,
) -> Rendered {
    let progress = ProgressBars::new_filtered(&[("content", index.len())]);
    let failures = AtomicUsize::new(0);

    let written: Vec<Option<String>> = index
        .pages()
        .par_iter()
        .map(|page| {
            let result = resolver
                .render(page, site.for_page(page, index))
                .and_then(|html| write_html(config, &page.output, &html));
            if let Some(progress) = &progress {
                progress.inc("content");
            }
            match result {
                Ok(()) => Some(page.url.clone()),
                Err(e) => {
                    log!("error"; "{}: {e}", page.source.display());
                    failures.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();

    Rendered {
        written: written.into_iter().flatten().collect(),
        failures: failures.into_inner(),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create the output directory, clearing it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// `person_tags.json` → `person_tags.pending.json`, next to the directory file.
fn pending_path(person_tags: &Path) -> PathBuf {
    person_tags.with_extension("pending.json")
}

fn log_summary(report: &BuildReport) {
    let secs = report.elapsed.as_secs_f64();
    let total = report.pages + report.archives;
    let rate = if secs > 0.0 { total as f64 / secs } else { total as f64 };

    log!(
        "build";
        "{} pages, {} archive pages, {} feeds in {:.2}s ({:.0} pages/s)",
        report.pages,
        report.archives,
        report.feeds,
        secs,
        rate
    );

    if report.skipped_future > 0 || report.skipped_empty > 0 {
        log!(
            "build";
            "skipped {} scheduled and {} empty documents",
            report.skipped_future,
            report.skipped_empty
        );
    }
    if report.failures > 0 {
        log!("error"; "{} failures", report.failures);
    }
}

// ============================================================================
// Tests
// ============================================================================
