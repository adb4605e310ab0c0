//! Sitemap generation.
//!
//! Lists every produced page with the build date as `lastmod`:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/2024/03/01/hello/</loc>
//!     <lastmod>2024-03-02</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{fs, path::PathBuf};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Write the sitemap for site-relative `urls`.
///
/// Returns the written path, or `None` when disabled or when `[base].url`
/// is unset.
pub fn build_sitemap(config: &SiteConfig, urls: &[String], date: NaiveDate) -> Result<Option<PathBuf>> {
    if !config.build.sitemap.enable {
        return Ok(None);
    }
    if config.base.url.is_none() {
        log!("sitemap"; "no [base].url, sitemap skipped");
        return Ok(None);
    }

    let sitemap = Sitemap::new(config, urls, date);
    sitemap.write(config).map(Some)
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

struct Sitemap {
    /// Absolute urls, sorted and unique.
    urls: Vec<String>,
    lastmod: String,
}

impl Sitemap {
    fn new(config: &SiteConfig, urls: &[String], date: NaiveDate) -> Self {
        let mut urls: Vec<String> = urls.iter().map(|u| config.absolute_url(u)).collect();
        urls.sort();
        urls.dedup();

        Self {
            urls,
            lastmod: date.format("%Y-%m-%d").to_string(),
        }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(64 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for loc in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", self.lastmod));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn write(self, config: &SiteConfig) -> Result<PathBuf> {
        let path = config.build.output.join(&config.build.sitemap.path);
        let count = self.urls.len();
        let xml = self.into_xml();
        let xml = minify(MinifyType::Xml(xml.as_bytes()), config);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &*xml)
            .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

        log!("sitemap"; "{} ({count} urls)", config.build.sitemap.path.display());
        Ok(path)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(output: &std::path::Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://coffee.example/".into());
        config.build.output = output.to_path_buf();
        config
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<q>'x'</q>"), "&lt;q&gt;&apos;x&apos;&lt;/q&gt;");
    }

    #[test]
    fn test_sitemap_sorted_absolute() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let urls = vec![
            "/category/coffee/".to_string(),
            "/2024/03/01/hello/".to_string(),
            "/category/coffee/".to_string(),
        ];

        let xml = Sitemap::new(&config, &urls, date()).into_xml();
        let locs: Vec<_> = xml
            .lines()
            .filter_map(|l| l.trim().strip_prefix("<loc>"))
            .collect();

        assert_eq!(
            locs,
            vec![
                "https://coffee.example/2024/03/01/hello/</loc>",
                "https://coffee.example/category/coffee/</loc>",
            ]
        );
        assert_eq!(xml.matches("<lastmod>2024-03-02</lastmod>").count(), 2);
    }

    #[test]
    fn test_sitemap_xml_structure() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let xml = Sitemap::new(&config, &[], date()).into_xml();

        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert_eq!(lines[1], format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        assert_eq!(lines.last().map(|l| l.trim()), Some("</urlset>"));
    }

    #[test]
    fn test_build_sitemap_writes_file() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());

        let path = build_sitemap(&config, &["/about/".into()], date()).unwrap().unwrap();
        assert_eq!(path, dir.path().join("sitemap.xml"));
        assert!(fs::read_to_string(path).unwrap().contains("https://coffee.example/about/"));
    }

    #[test]
    fn test_build_sitemap_skipped() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path());

        config.build.sitemap.enable = false;
        assert!(build_sitemap(&config, &["/a/".into()], date()).unwrap().is_none());

        config.build.sitemap.enable = true;
        config.base.url = None;
        assert!(build_sitemap(&config, &["/a/".into()], date()).unwrap().is_none());
        assert!(!dir.path().join("sitemap.xml").exists());
    }
}
