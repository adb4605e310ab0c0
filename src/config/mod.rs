//! Site configuration management for `almanac.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url, avatar)         |
//! | `[build]`   | Paths, layouts, workers, groups, archive, sitemap  |
//! | `[feed]`    | Feed directory, window size and channel list       |
//! | `[extra]`   | User-defined custom fields                         |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Coffee Blog"
//! url = "https://coffee.example"
//!
//! [build]
//! output = "_site"
//! per_page = 10
//!
//! [[feed.channels]]
//! file = "posts.xml"
//! title = "Coffee Blog - Posts"
//! source = "posts"
//!
//! [extra]
//! analytics_id = "UA-12345"
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod feed;

pub use build::{AutoGenerate, GroupConfig};
pub use error::ConfigError;
pub use feed::{ChannelConfig, FeedFormat};

use base::BaseConfig;
use build::BuildConfig;
use feed::FeedConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing almanac.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Base URL without a trailing slash, empty when unset.
    pub fn base_url(&self) -> &str {
        self.base.url.as_deref().unwrap_or_default().trim_end_matches('/')
    }

    /// Join a site-relative path onto the base URL.
    ///
    /// Already-absolute URLs are returned unchanged.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Group configured for a name, if any.
    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.build.groups.iter().find(|g| g.name == name)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => {
                Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
                if build_args.clean {
                    self.build.clean = true;
                }
                if let Some(url) = &build_args.base_url {
                    self.base.url = Some(url.clone());
                }
                if let Some(variant) = &build_args.layout_variant {
                    self.build.layout_variant = Some(variant.clone());
                }
            }
        }

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.apply_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every configured path against `root` and normalize to absolute paths
    pub fn apply_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.layouts = Self::normalize_path(&root.join(&self.build.layouts));
        self.build.includes = Self::normalize_path(&root.join(&self.build.includes));
        self.build.person_tags = Self::normalize_path(&root.join(&self.build.person_tags));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values that serde cannot check
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if !self.feed.channels.is_empty() && self.base.url.is_none() {
            bail!(ConfigError::Validation(
                "[base.url] is required when [[feed.channels]] are configured".into()
            ));
        }

        if self.build.per_page == 0 {
            bail!(ConfigError::Validation("[build.per_page] must be positive".into()));
        }

        if self.build.workers == 0 {
            bail!(ConfigError::Validation("[build.workers] must be positive".into()));
        }

        for channel in &self.feed.channels {
            if channel.format().is_none() {
                bail!(ConfigError::Validation(format!(
                    "[[feed.channels]] `{}` has no format and an unknown extension",
                    channel.file.display()
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Coffee"
            url = "https://coffee.example/"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "Coffee");
        assert_eq!(config.base_url(), "https://coffee.example");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[base\ntitle = ");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/nonexistent/almanac.toml")).unwrap_err();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_apply_root() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.apply_root(dir.path());

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.output, root.join("_site"));
        assert_eq!(config.build.layouts, root.join("_layouts"));
        assert_eq!(config.build.person_tags, root.join("person_tags.json"));
    }

    #[test]
    fn test_absolute_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://coffee.example/".into());

        assert_eq!(config.absolute_url("/2024/03/01/hi/"), "https://coffee.example/2024/03/01/hi/");
        assert_eq!(config.absolute_url("assets/a.jpg"), "https://coffee.example/assets/a.jpg");
        assert_eq!(config.absolute_url("https://cdn.example/a.jpg"), "https://cdn.example/a.jpg");
    }

    #[test]
    fn test_extra_fields() {
        let config = SiteConfig::from_str(
            r#"
            [extra]
            analytics_id = "UA-12345"
            show_sparkline = true
        "#,
        )
        .unwrap();

        assert_eq!(
            config.extra.get("analytics_id").and_then(|v| v.as_str()),
            Some("UA-12345")
        );
        assert_eq!(
            config.extra.get("show_sparkline").and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("coffee.example".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_url_for_feeds() {
        let config = SiteConfig::from_str(
            r#"
            [[feed.channels]]
            file = "posts.xml"
            title = "Posts"
            source = "posts"
        "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[base.url]"));
    }

    #[test]
    fn test_validate_rejects_unknown_feed_extension() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            url = "https://coffee.example"

            [[feed.channels]]
            file = "posts.txt"
            title = "Posts"
            source = "posts"
        "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_per_page() {
        let mut config = SiteConfig::default();
        config.build.per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SiteConfig::from_str("[theme]\nname = \"dark\"");
        assert!(result.is_err());
    }
}
