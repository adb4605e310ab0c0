//! Layout cache.
//!
//! Every `<layouts>/<name>.html` is read once at startup. A layout may name
//! its parent in front matter:
//!
//! ```text
//! ---
//! layout: default
//! ---
//! <article>{{ content }}</article>
//! ```
//!
//! The resulting graph is validated before any document is touched:
//!
//! ```text
//! post ──► default ──► (root)        ok
//! loop-a ──► loop-b ──► loop-a       recorded as cyclic, logged
//! ```
//!
//! Files in the includes directory are registered as `_includes/<file>` so
//! both layouts and document bodies can `{% include %}` them.

use super::filters;
use crate::error::{RenderError, SetupError};
use crate::log;
use gray_matter::{Matter, engine::YAML};
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};
use tera::Tera;
use walkdir::WalkDir;

const INCLUDE_PREFIX: &str = "_includes";

/// A named wrapper template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub name: String,
    pub parent: Option<String>,
}

/// Read-only after load.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    layouts: BTreeMap<String, Layout>,
    engine: Tera,
    default_layout: String,
    variant: Option<String>,
    /// Layout name → offending chain, for every layout on a cycle.
    cyclic: BTreeMap<String, Vec<String>>,
}

impl LayoutCache {
    /// Load layouts and includes from disk.
    pub fn load(
        layouts_dir: &Path,
        includes_dir: &Path,
        default_layout: &str,
        variant: Option<&str>,
    ) -> Result<Self, SetupError> {
        if !layouts_dir.is_dir() {
            return Err(SetupError::MissingLayouts(layouts_dir.to_path_buf()));
        }

        let layouts = read_templates(layouts_dir, 1)?;
        let includes = if includes_dir.is_dir() {
            read_templates(includes_dir, usize::MAX)?
        } else {
            Vec::new()
        };

        Self::from_sources(layouts, includes, default_layout, variant)
    }

    /// Build the cache from `(name, raw source)` pairs.
    pub fn from_sources(
        layouts: Vec<(String, String)>,
        includes: Vec<(String, String)>,
        default_layout: &str,
        variant: Option<&str>,
    ) -> Result<Self, SetupError> {
        let mut engine = Tera::default();
        engine.autoescape_on(vec![]);
        filters::register(&mut engine);

        for (name, source) in includes {
            let name = format!("{INCLUDE_PREFIX}/{name}");
            engine
                .add_raw_template(&name, &source)
                .map_err(|e| SetupError::Layout(name.clone(), flatten(&e)))?;
        }

        let matter = Matter::<YAML>::new();
        let mut parsed = BTreeMap::new();
        for (name, raw) in layouts {
            let (parent, body) = match matter.parse::<serde_yaml::Value>(&raw) {
                Ok(entity) => {
                    let parent = entity
                        .data
                        .as_ref()
                        .and_then(|data| data.get("layout"))
                        .and_then(|v| v.as_str())
                        .map(str::to_owned)
                        .filter(|p| !p.is_empty());
                    (parent, entity.content)
                }
                Err(e) => return Err(SetupError::Layout(name, e.to_string())),
            };

            engine
                .add_raw_template(&name, &body)
                .map_err(|e| SetupError::Layout(name.clone(), flatten(&e)))?;
            parsed.insert(name.clone(), Layout { name, parent });
        }

        if let Some(variant) = variant
            && !parsed.contains_key(variant)
        {
            return Err(SetupError::MissingVariant(variant.to_owned()));
        }

        let mut cache = Self {
            layouts: parsed,
            engine,
            default_layout: default_layout.to_owned(),
            variant: variant.map(str::to_owned),
            cyclic: BTreeMap::new(),
        };
        cache.validate();
        Ok(cache)
    }

    /// Walk every layout chain once and record the cyclic ones.
    fn validate(&mut self) {
        let mut cyclic = BTreeMap::new();
        for name in self.layouts.keys() {
            match self.chain(name) {
                Err(RenderError::TemplateCycle(chain)) => {
                    log!("layout"; "cycle: {}", chain.join(" -> "));
                    cyclic.insert(name.clone(), chain);
                }
                Err(RenderError::UnknownLayout(parent)) => {
                    log!("layout"; "`{name}` extends unknown layout `{parent}`");
                }
                _ => {}
            }
        }
        self.cyclic = cyclic;
    }

    /// Layout name after variant substitution.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        match &self.variant {
            Some(variant) if name == self.default_layout => variant,
            _ => name,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(self.resolve_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Parent of a layout, after variant substitution.
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.get(name)?
            .parent
            .as_deref()
            .map(|p| self.resolve_name(p))
    }

    /// Resolved layout names from `start` up to the root layout.
    ///
    /// Iterative with a visited list; a revisit fails with the chain that
    /// led back to it.
    pub fn chain(&self, start: &str) -> Result<Vec<String>, RenderError> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = Some(self.resolve_name(start));

        while let Some(name) = current {
            if chain.iter().any(|seen| seen == name) {
                chain.push(name.to_owned());
                return Err(RenderError::TemplateCycle(chain));
            }
            if !self.layouts.contains_key(name) {
                return Err(RenderError::UnknownLayout(name.to_owned()));
            }
            chain.push(name.to_owned());
            current = self.parent(name);
        }

        Ok(chain)
    }

    /// Engine holding every layout and include.
    pub fn engine(&self) -> &Tera {
        &self.engine
    }

    pub fn is_cyclic(&self, name: &str) -> bool {
        self.cyclic.contains_key(self.resolve_name(name))
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }
}

/// Read `*.html` files under `dir` as `(relative name, source)` pairs.
///
/// Layout names drop the extension; include names keep the relative path.
fn read_templates(dir: &Path, max_depth: usize) -> Result<Vec<(String, String)>, SetupError> {
    let mut templates = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            SetupError::Io(path, e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = if max_depth == 1 {
            if path.extension().is_none_or(|ext| ext != "html") {
                continue;
            }
            relative.with_extension("")
        } else {
            relative.to_path_buf()
        };
        let name = name.to_string_lossy().replace('\\', "/");

        let source =
            fs::read_to_string(path).map_err(|e| SetupError::Io(path.to_path_buf(), e))?;
        templates.push((name, source));
    }

    Ok(templates)
}

fn flatten(err: &tera::Error) -> String {
    match RenderError::template("", err) {
        RenderError::Template { message, .. } => message,
        other => other.to_string(),
    }
}
