//! `[build]` section configuration.
//!
//! Contains build settings including paths, layouts, groups, archives and sitemap.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// Auto-generated page families, toggled by `[build].auto_generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoGenerate {
    /// Paginated `/category/<slug>/` listings.
    Category,
    /// Paginated `/tag/<slug>/` listings.
    Tag,
    /// `/YYYY/` and `/YYYY/MM/` listings plus the archive index.
    DateArchive,
    /// Paginated `/<group>/` listings for each configured group.
    ListPage,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in almanac.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "."            # Content root with per-type subdirectories
/// output = "_site"         # Output directory
/// layouts = "_layouts"     # Named wrapper templates
/// workers = 15
///
/// [[build.groups]]
/// name = "likes"
/// category = "Like"
/// layout = "like"
/// directory = "_likes"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content root; documents live in its subdirectories.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Layout directory (`<name>.html`, optional `layout:` parent in front matter).
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Partial templates available to `{% include "_includes/..." %}`.
    #[serde(default = "defaults::build::includes")]
    #[educe(Default = defaults::build::includes())]
    pub includes: PathBuf,

    /// Name of the content subdirectory holding dated posts.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: String,

    /// Template-root directory name, stripped from generated URLs.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: String,

    /// Content subdirectory names that are never scanned.
    #[serde(default = "defaults::build::ignore")]
    #[educe(Default = defaults::build::ignore())]
    pub ignore: Vec<String>,

    /// Person-tag directory (JSON, lowercase handle → profile).
    #[serde(default = "defaults::build::person_tags")]
    #[educe(Default = defaults::build::person_tags())]
    pub person_tags: PathBuf,

    /// Minify HTML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Worker pool size.
    #[serde(default = "defaults::build::workers")]
    #[educe(Default = defaults::build::workers())]
    pub workers: usize,

    /// Items per archive page.
    #[serde(default = "defaults::build::per_page")]
    #[educe(Default = defaults::build::per_page())]
    pub per_page: usize,

    /// Layout replaced by `layout_variant` when one is set.
    #[serde(default = "defaults::build::default_layout")]
    #[educe(Default = defaults::build::default_layout())]
    pub default_layout: String,

    /// Alternate layout substituted for `default_layout` everywhere.
    #[serde(default)]
    pub layout_variant: Option<String>,

    /// Enabled auto-generated page families.
    #[serde(default = "defaults::build::auto_generate")]
    #[educe(Default = defaults::build::auto_generate())]
    pub auto_generate: Vec<AutoGenerate>,

    /// Named collections (likes, bookmarks, replies, ...).
    #[serde(default = "defaults::build::groups")]
    #[educe(Default = defaults::build::groups())]
    pub groups: Vec<GroupConfig>,

    /// Archive page layouts and paths.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

impl BuildConfig {
    /// Whether an auto-generated page family is enabled.
    pub fn generates(&self, kind: AutoGenerate) -> bool {
        self.auto_generate.contains(&kind)
    }
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[[build.groups]]` entry - a named collection of pages.
///
/// A page joins the group when any of these hold:
/// - its categories contain `category` (case-insensitive)
/// - its layout, minus a trailing `s`, equals `layout`
/// - its containing directory equals `directory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    /// Expand `@handle` mentions for members of this group.
    #[serde(default)]
    pub mentions: bool,
}

impl GroupConfig {
    pub fn matches(&self, categories: &[String], layout: &str, directory: &str) -> bool {
        let by_category = self.category.as_deref().is_some_and(|wanted| {
            categories.iter().any(|c| c.eq_ignore_ascii_case(wanted))
        });
        let by_layout = self.layout.as_deref().is_some_and(|wanted| {
            layout.trim_end_matches('s').eq_ignore_ascii_case(wanted.trim_end_matches('s'))
        });
        let by_directory = self.directory.as_deref() == Some(directory);

        by_category || by_layout || by_directory
    }
}

/// `[build.archive]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Layout for category, tag and date listings.
    #[serde(default = "defaults::build::archive::layout")]
    #[educe(Default = defaults::build::archive::layout())]
    pub layout: String,

    /// Layout for the year/month summary page.
    #[serde(default = "defaults::build::archive::index_layout")]
    #[educe(Default = defaults::build::archive::index_layout())]
    pub index_layout: String,

    /// URL segment of the year/month summary page.
    #[serde(default = "defaults::build::archive::index_path")]
    #[educe(Default = defaults::build::archive::index_path())]
    pub index_path: String,
}

/// `[build.sitemap]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// Enable sitemap generation.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path for the sitemap, relative to the output directory.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]\ntitle = \"Test\"").unwrap();

        assert_eq!(config.build.content, PathBuf::from("."));
        assert_eq!(config.build.output, PathBuf::from("_site"));
        assert_eq!(config.build.layouts, PathBuf::from("_layouts"));
        assert_eq!(config.build.posts, "_posts");
        assert_eq!(config.build.workers, 15);
        assert_eq!(config.build.per_page, 10);
        assert!(!config.build.minify);
        assert!(!config.build.clean);
        assert!(config.build.sitemap.enable);
        assert_eq!(config.build.groups.len(), 7);
        assert!(config.build.generates(AutoGenerate::DateArchive));
    }

    #[test]
    fn test_auto_generate_subset() {
        let config = r#"
            [build]
            auto_generate = ["category", "list_page"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(config.build.generates(AutoGenerate::Category));
        assert!(config.build.generates(AutoGenerate::ListPage));
        assert!(!config.build.generates(AutoGenerate::Tag));
        assert!(!config.build.generates(AutoGenerate::DateArchive));
    }

    #[test]
    fn test_custom_groups_replace_defaults() {
        let config = r#"
            [[build.groups]]
            name = "coffee"
            category = "Coffee"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.groups.len(), 1);
        assert_eq!(config.build.groups[0].name, "coffee");
        assert_eq!(config.build.groups[0].layout, None);
        assert!(!config.build.groups[0].mentions);
    }

    #[test]
    fn test_group_matches() {
        let group = GroupConfig {
            name: "likes".into(),
            category: Some("Like".into()),
            layout: Some("like".into()),
            directory: Some("_likes".into()),
            mentions: false,
        };

        assert!(group.matches(&["like".into()], "post", "_posts"));
        assert!(group.matches(&[], "likes", "_posts"));
        assert!(group.matches(&[], "post", "_likes"));
        assert!(!group.matches(&["Liked".into()], "post", "_posts"));
    }

    #[test]
    fn test_layout_variant() {
        let config = r#"
            [build]
            layout_variant = "retro"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.layout_variant.as_deref(), Some("retro"));
        assert_eq!(config.build.default_layout, "default");
    }

    #[test]
    fn test_unknown_build_field_rejection() {
        let config = r#"
            [build]
            assets = "assets"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
