//! Output generation.
//!
//! | Module     | Output                                          |
//! |------------|-------------------------------------------------|
//! | `archive`  | paginated category, tag, group and date pages   |
//! | `feed`     | JF2, JSON Feed and RSS files under `[feed].dir` |
//! | `sitemap`  | `sitemap.xml` in the output root                |
//!
//! Rendered documents go through [`write_html`] as well, so every HTML
//! file shares the same minify step and directory handling.

pub mod archive;
pub mod feed;
pub mod sitemap;

use crate::config::SiteConfig;
use crate::error::RenderError;
use crate::utils::minify::{MinifyType, minify};
use std::{fs, path::Path};

/// Write an HTML file below the output root, minifying when enabled.
pub fn write_html(config: &SiteConfig, relative: &Path, html: &str) -> Result<(), RenderError> {
    let path = config.build.output.join(relative);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RenderError::Io(parent.to_path_buf(), e))?;
    }

    let html = minify(MinifyType::Html(html.as_bytes()), config);
    fs::write(&path, &*html).map_err(|e| RenderError::Io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_html_creates_parents() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.output = dir.path().to_path_buf();

        write_html(&config, Path::new("2024/03/01/hello/index.html"), "<p>hi</p>").unwrap();

        let written = fs::read_to_string(dir.path().join("2024/03/01/hello/index.html")).unwrap();
        assert_eq!(written, "<p>hi</p>");
    }

    #[test]
    fn test_write_html_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut config = SiteConfig::default();
        config.build.output = blocker.clone();

        let err = write_html(&config, Path::new("a/index.html"), "x").unwrap_err();
        assert!(matches!(err, RenderError::Io(path, _) if path.starts_with(&blocker)));
    }
}
