//! `@handle` mentions and the person-tag directory.
//!
//! The directory is a JSON object keyed by lowercase handle:
//!
//! ```json
//! { "coffee.example": { "full_name": "Coffee Blog", "url": "https://coffee.example",
//!                       "favicon": "https://coffee.example/favicon.ico" } }
//! ```
//!
//! | Handle                         | Body                        | Section entry        |
//! |--------------------------------|-----------------------------|----------------------|
//! | unknown                        | `[handle](https://handle)`  | same link            |
//! | unknown, `@handle[Name]`       | `[Name](https://handle)`    | same link            |
//! | known, contains `.`            | `[full_name](https://handle)` | favicon card or link |
//! | known, no `.`                  | unchanged                   | none                 |

use super::document::SourceFormat;
use crate::error::SetupError;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
    sync::LazyLock,
};

/// `@handle`, optionally followed by `[Display Name]`.
///
/// The leading group stands in for a look-behind: a mention never follows a
/// word character, `/` or `.`, which rules out emails and URLs. Handles end
/// on a word character, so trailing punctuation and `'s` stay outside.
static RE_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w@/.])@([A-Za-z0-9_](?:[\w.\-]*\w)?)(?:\[([^\]\n]+)\])?").unwrap()
});

const SECTION_TITLE: &str = "Mentioned in this post";

/// One person-tag directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub full_name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// Read-only handle → person lookup.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct MentionDirectory {
    people: FxHashMap<String, Person>,
}

/// Result of expanding mentions in one document body.
#[derive(Debug, Default, PartialEq)]
pub struct Expansion {
    pub text: String,
    /// Handles with no directory entry, lowercase, first-appearance order.
    pub unresolved: Vec<String>,
}

impl MentionDirectory {
    /// Load the directory; a missing file yields an empty directory.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| SetupError::Io(path.to_path_buf(), e))?;
        let people: FxHashMap<String, Person> = serde_json::from_str(&content)
            .map_err(|e| SetupError::PersonTags(path.to_path_buf(), e))?;

        let people = people
            .into_iter()
            .map(|(handle, person)| (handle.to_lowercase(), person))
            .collect();
        Ok(Self { people })
    }

    pub fn from_people(people: impl IntoIterator<Item = (String, Person)>) -> Self {
        Self {
            people: people.into_iter().map(|(h, p)| (h.to_lowercase(), p)).collect(),
        }
    }

    pub fn get(&self, handle: &str) -> Option<&Person> {
        self.people.get(&handle.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Rewrite every mention in `source` and append the mention section.
    ///
    /// Markdown sources get markdown links; HTML sources get anchors.
    pub fn expand(&self, source: &str, format: SourceFormat) -> Expansion {
        let mut entries: Vec<String> = Vec::new();
        let mut unresolved: Vec<String> = Vec::new();

        let text = RE_MENTION.replace_all(source, |caps: &Captures<'_>| {
            let lead = &caps[1];
            let handle = caps[2].to_lowercase();
            let href = format!("https://{handle}");

            let (link, entry) = match self.people.get(&handle) {
                None => {
                    let name = caps.get(3).map_or(handle.as_str(), |m| m.as_str());
                    let link = markup_link(format, name, &href);
                    if !unresolved.contains(&handle) {
                        unresolved.push(handle.clone());
                    }
                    (link.clone(), link)
                }
                Some(person) if handle.contains('.') => {
                    let entry = match &person.favicon {
                        Some(favicon) => format!(
                            "<p><a href='{}'><img src='{favicon}' alt='{handle}' height='32' width='32' class='profile_tag'> {}</a></p>",
                            person.url, person.full_name
                        ),
                        None => markup_link(format, &person.full_name, &person.url),
                    };
                    (markup_link(format, &person.full_name, &href), entry)
                }
                Some(_) => return caps[0].to_owned(),
            };

            if !entries.contains(&entry) {
                entries.push(entry);
            }
            format!("{lead}{link}")
        });

        let mut text = text.into_owned();
        if !entries.is_empty() {
            match format {
                SourceFormat::Markdown => {
                    text.push_str(&format!("\n\n## {SECTION_TITLE}\n\n"));
                    text.push_str(&entries.join("\n\n"));
                    text.push('\n');
                }
                SourceFormat::Html => {
                    text.push_str(&format!("\n<h2>{SECTION_TITLE}</h2>\n"));
                    for entry in &entries {
                        if entry.starts_with("<p>") {
                            text.push_str(entry);
                        } else {
                            text.push_str(&format!("<p>{entry}</p>"));
                        }
                        text.push('\n');
                    }
                }
            }
        }

        Expansion { text, unresolved }
    }
}

fn markup_link(format: SourceFormat, text: &str, href: &str) -> String {
    match format {
        SourceFormat::Markdown => format!("[{text}]({href})"),
        SourceFormat::Html => format!("<a href=\"{href}\">{text}</a>"),
    }
}

/// Strip `@` mention markers from excerpt text.
pub fn strip_markers(text: &str) -> String {
    RE_MENTION
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps.get(3).map_or(&caps[2], |m| m.as_str());
            format!("{}{name}", &caps[1])
        })
        .into_owned()
}

/// Write handles awaiting confirmation to `path`.
///
/// Entries already in the file are kept, so names confirmed by hand in an
/// earlier run are not lost. An unreadable existing file is an error and is
/// left untouched. Nothing is written when there are no handles.
pub fn write_pending(path: &Path, handles: &BTreeSet<String>) -> Result<()> {
    if handles.is_empty() {
        return Ok(());
    }

    let mut pending: BTreeMap<String, Person> = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    for handle in handles {
        pending.entry(handle.clone()).or_insert_with(|| Person {
            full_name: handle.clone(),
            url: format!("https://{handle}"),
            favicon: None,
        });
    }

    let json = serde_json::to_string_pretty(&pending)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
