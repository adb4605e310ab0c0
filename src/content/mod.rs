//! Content loading and enrichment.
//!
//! ```text
//! content root
//! ├── _posts/2024-03-01-hello.md   ─┐
//! ├── _notes/2024-03-02-brew.md     ├─► scan ─► Document ─► enrich ─► Page
//! ├── _likes/2024-03-03-like.md     │
//! └── templates/about.html         ─┘
//! ```

mod document;
mod enrich;
pub mod mention;
mod page;

pub use document::{Document, DocumentKind, QuotedContext, SourceFormat};
pub use enrich::{EnrichContext, Enriched, SkipReason, enrich};
pub use mention::MentionDirectory;
pub use page::{Interaction, InteractionKind, Page, PageRef};

#[cfg(test)]
pub(crate) use page::tests::page as test_page;

use crate::config::SiteConfig;
use crate::error::SetupError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect every content file below the per-type subdirectories.
///
/// Only files at depth 2 or below count, so loose files in the content
/// root are ignored. Dot-directories, the output, layouts and includes directories and every
/// `build.ignore` name are pruned.
pub fn scan(config: &SiteConfig) -> Result<Vec<PathBuf>, SetupError> {
    let root = &config.build.content;
    if !root.is_dir() {
        return Err(SetupError::MissingContent(root.clone()));
    }

    let pruned: Vec<&Path> = [
        config.build.output.as_path(),
        config.build.layouts.as_path(),
        config.build.includes.as_path(),
    ]
    .into_iter()
    .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_type().is_dir() {
                return !name.starts_with('.')
                    && !config.build.ignore.iter().any(|ignored| *ignored == name)
                    && !pruned.iter().any(|p| *p == entry.path());
            }
            true
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.depth() >= 2 && entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| SourceFormat::from_path(path).is_some())
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.apply_root(dir);
        config
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "---\nlayout: x\n---\nx").unwrap();
    }

    #[test]
    fn test_scan_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "_posts/2024-03-01-a.md");
        touch(root, "_notes/deep/b.markdown");
        touch(root, "templates/about.html");
        touch(root, "_drafts/c.md");
        touch(root, ".git/d.md");
        touch(root, "_layouts/default.html");
        touch(root, "_includes/nav.html");
        touch(root, "_site/index.html");
        touch(root, "_posts/image.png");
        touch(root, "README.md");

        let config = config_for(root);
        let files = scan(&config).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(&config.build.content).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(
            relative,
            vec!["_notes/deep/b.markdown", "_posts/2024-03-01-a.md", "templates/about.html"]
        );
    }

    #[test]
    fn test_scan_prunes_top_level_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "_layouts/post.html");
        touch(root, "_layouts/nested/base.html");
        touch(root, "_site/2024/03/01/a/index.html");
        touch(root, ".cache/x.md");

        let mut config = config_for(root);
        config.build.ignore = vec!["scratch".into()];
        touch(root, "scratch/y.md");

        assert!(scan(&config).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(dir.path());
        config.build.content = dir.path().join("missing");

        assert!(matches!(scan(&config), Err(SetupError::MissingContent(_))));
    }
}
