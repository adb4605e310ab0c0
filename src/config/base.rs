//! `[base]` section configuration.
//!
//! Contains basic site information like title, author, description, etc.
//! Everything here is also exposed to templates under `site`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in almanac.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "Coffee Blog"
/// description = "Notes on coffee and code"
/// author = "Alice"
/// url = "https://coffee.example"
/// avatar = "https://coffee.example/assets/me.jpg"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title used by layouts and as the feed fallback title.
    #[serde(default)]
    pub title: String,

    /// Author name for feeds and the default post title.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Author email for the rss `managingEditor` field.
    #[serde(default = "defaults::base::email")]
    #[educe(Default = defaults::base::email())]
    pub email: String,

    /// Site description for meta tags and feed subtitles.
    #[serde(default)]
    pub description: String,

    /// Base URL for absolute links in feeds and the sitemap.
    /// Required when any `[[feed.channels]]` entry is configured.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Author photo, used for feed author cards.
    #[serde(default)]
    pub avatar: String,

    /// Site logo, used as the rss channel image.
    #[serde(default = "defaults::base::logo")]
    #[educe(Default = defaults::base::logo())]
    pub logo: String,

    /// BCP 47 language code (e.g., "en", "en-GB").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Copyright notice for site footer.
    #[serde(default)]
    pub copyright: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Coffee Blog"
            description = "Notes on coffee"
            url = "https://coffee.example"
            avatar = "https://coffee.example/me.jpg"
            language = "en-GB"
            copyright = "2024 Alice"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Coffee Blog");
        assert_eq!(config.base.description, "Notes on coffee");
        assert_eq!(config.base.url, Some("https://coffee.example".to_string()));
        assert_eq!(config.base.avatar, "https://coffee.example/me.jpg");
        assert_eq!(config.base.language, "en-GB");
        assert_eq!(config.base.copyright, "2024 Alice");
    }

    #[test]
    fn test_base_config_defaults() {
        let config = r#"
            [base]
            title = "Test"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.author, "<YOUR_NAME>");
        assert_eq!(config.base.email, "user@noreply.almanac");
        assert_eq!(config.base.language, "en");
        assert_eq!(config.base.logo, "/favicon.ico");
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.description, "");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn test_base_config_unicode() {
        let config = r#"
            [base]
            title = "Café ☕"
            author = "René"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Café ☕");
        assert_eq!(config.base.author, "René");
    }
}
