//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.almanac".into()
    }

    pub fn language() -> String {
        "en".into()
    }

    pub fn logo() -> String {
        "/favicon.ico".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use super::super::build::{AutoGenerate, GroupConfig};
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        ".".into()
    }

    pub fn output() -> PathBuf {
        "_site".into()
    }

    pub fn layouts() -> PathBuf {
        "_layouts".into()
    }

    pub fn includes() -> PathBuf {
        "_includes".into()
    }

    pub fn posts() -> String {
        "_posts".into()
    }

    pub fn templates() -> String {
        "templates".into()
    }

    pub fn ignore() -> Vec<String> {
        vec!["_drafts".into(), "assets".into(), "node_modules".into()]
    }

    pub fn person_tags() -> PathBuf {
        "person_tags.json".into()
    }

    pub fn workers() -> usize {
        15
    }

    pub fn per_page() -> usize {
        10
    }

    pub fn default_layout() -> String {
        "default".into()
    }

    pub fn auto_generate() -> Vec<AutoGenerate> {
        vec![
            AutoGenerate::Category,
            AutoGenerate::Tag,
            AutoGenerate::DateArchive,
            AutoGenerate::ListPage,
        ]
    }

    pub fn groups() -> Vec<GroupConfig> {
        [
            ("likes", "Like", "like", "_likes", false),
            ("bookmarks", "Bookmark", "bookmark", "_bookmarks", false),
            ("replies", "Reply", "webmention", "_replies", true),
            ("reposts", "Repost", "repost", "_reposts", false),
            ("watches", "Watch", "watch", "_watches", false),
            ("notes", "Note", "note", "_notes", false),
            ("rsvps", "RSVP", "rsvp", "_rsvps", false),
        ]
        .into_iter()
        .map(|(name, category, layout, directory, mentions)| GroupConfig {
            name: name.into(),
            category: Some(category.into()),
            layout: Some(layout.into()),
            directory: Some(directory.into()),
            mentions,
        })
        .collect()
    }

    pub mod archive {
        pub fn layout() -> String {
            "category".into()
        }

        pub fn index_layout() -> String {
            "archive".into()
        }

        pub fn index_path() -> String {
            "archive".into()
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }
}

// ============================================================================
// [feed] Section Defaults
// ============================================================================

pub mod feed {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "feeds".into()
    }

    pub fn items() -> usize {
        20
    }
}
