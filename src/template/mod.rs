//! Template resolution.
//!
//! A page body is itself a template. It renders first, then its output is
//! handed up the layout chain as `content`:
//!
//! ```text
//! body ──render──► content ──post──► content ──default──► final html
//! ```
//!
//! The loop keeps the names it has visited, so a chain that slipped past
//! load-time validation still ends in `TemplateCycle` instead of spinning.

mod context;
mod filters;
mod layouts;

pub use context::SiteContext;
pub use layouts::LayoutCache;

use crate::content::Page;
use crate::error::RenderError;
use tera::Context;

/// Renders bodies and layout chains against a loaded [`LayoutCache`].
#[derive(Clone, Copy)]
pub struct TemplateResolver<'a> {
    layouts: &'a LayoutCache,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(layouts: &'a LayoutCache) -> Self {
        Self { layouts }
    }

    /// Render a page body, then wrap it in the page's layout chain.
    pub fn render(&self, page: &Page, context: Context) -> Result<String, RenderError> {
        let content = self.render_body(&page.url, &page.body, &context)?;
        self.render_layout(&page.layout, content, context)
    }

    /// Render raw text as a one-off template.
    ///
    /// Includes and filters are available. Text without template syntax is
    /// returned as is.
    pub fn render_body(&self, name: &str, body: &str, context: &Context) -> Result<String, RenderError> {
        if !has_template_syntax(body) {
            return Ok(body.to_owned());
        }

        let mut engine = self.layouts.engine().clone();
        engine
            .render_str(body, context)
            .map_err(|e| RenderError::template(name, &e))
    }

    /// Wrap `content` in `layout` and each of its ancestors.
    pub fn render_layout(
        &self,
        layout: &str,
        content: String,
        mut context: Context,
    ) -> Result<String, RenderError> {
        let mut output = content;
        let mut visited: Vec<String> = Vec::new();
        let mut current = Some(self.layouts.resolve_name(layout).to_owned());

        while let Some(name) = current {
            if visited.contains(&name) {
                visited.push(name);
                return Err(RenderError::TemplateCycle(visited));
            }
            if !self.layouts.contains(&name) {
                return Err(RenderError::UnknownLayout(name));
            }

            context.insert("content", &output);
            output = self
                .layouts
                .engine()
                .render(&name, &context)
                .map_err(|e| RenderError::template(&name, &e))?;

            current = self.layouts.parent(&name).map(str::to_owned);
            visited.push(name);
        }

        Ok(output)
    }
}

fn has_template_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}
