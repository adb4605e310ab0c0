//! URL slugification and path utilities.
//!
//! Converts bucket names and content paths to URL-safe formats, and maps
//! URLs onto output files.

use std::path::{Component, Path, PathBuf};

/// Characters removed from bucket slugs
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '/', '(', ')', '[', ']', '\'', '’', '"', '\t', '\r',
    '\n',
];

// ============================================================================
// Slugification
// ============================================================================

/// Slug for a bucket (category, tag or group) name.
///
/// Lower-cases, turns spaces into hyphens and drops parentheses, apostrophes
/// and path-hostile characters: `"Coffee (Series)"` → `"coffee-series"`.
pub fn bucket_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .trim_matches('-')
        .to_owned()
}

// ============================================================================
// URL / Path Mapping
// ============================================================================

/// Normalize a site path into a URL.
///
/// | Input                      | Output          |
/// |----------------------------|-----------------|
/// | `about`                    | `/about/`       |
/// | `/notes/index.html`        | `/notes/`       |
/// | `/projects/tool.html`      | `/projects/tool/` |
/// | `/`                        | `/`             |
pub fn normalize_url(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    let trimmed = trimmed.strip_suffix("index.html").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(".html").unwrap_or(trimmed);
    let trimmed = trimmed.trim_matches('/');

    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}

/// Output file for a URL, relative to the output root.
///
/// `/2024/03/01/hello/` → `2024/03/01/hello/index.html`
pub fn url_to_output(url: &str) -> PathBuf {
    let relative = url.trim_matches('/');
    if relative.is_empty() {
        PathBuf::from("index.html")
    } else {
        Path::new(relative).join("index.html")
    }
}

/// Site path of a content file relative to the content root.
///
/// Strips the extension, leading underscores of directory names, and any
/// `templates` root segment: `_notes/hello.md` → `notes/hello`,
/// `templates/about.html` → `about`, `templates/index.html` → `` (home).
pub fn content_url_path(relative: &Path, template_root: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let components: Vec<_> = relative.components().collect();
    let last = components.len().saturating_sub(1);

    for (i, component) in components.iter().enumerate() {
        let Component::Normal(name) = component else {
            continue;
        };
        let name = name.to_string_lossy();

        if i == last {
            let stem = Path::new(name.as_ref())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if stem != "index" {
                segments.push(stem);
            }
        } else if i == 0 && name == template_root {
            continue;
        } else {
            segments.push(name.trim_start_matches('_').to_owned());
        }
    }

    segments.join("/")
}

// ============================================================================
// Tests
// ============================================================================
