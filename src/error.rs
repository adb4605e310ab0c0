//! Per-unit error types.
//!
//! | Error            | Unit of work    | Effect                                   |
//! |------------------|-----------------|------------------------------------------|
//! | `DocumentError`  | one document    | document skipped, build exits non-zero   |
//! | `RenderError`    | one page        | page not written, build exits non-zero   |
//! | `FeedError`      | one feed / item | item skipped or file logged as failed    |
//! | `SetupError`     | whole build     | build aborts immediately                 |
//!
//! Future-scheduled documents are not errors; they surface as
//! [`SkipReason::FutureScheduled`](crate::content::SkipReason).

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a document into a page.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("missing metadata: {0}")]
    MissingMetadata(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failure while resolving or rendering a layout chain.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("layout chain does not terminate: {}", .0.join(" -> "))]
    TemplateCycle(Vec<String>),

    #[error("unknown layout `{0}`")]
    UnknownLayout(String),

    #[error("template `{name}` failed: {message}")]
    Template { name: String, message: String },

    #[error("IO error when writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl RenderError {
    /// Flatten a tera error chain into one readable message.
    pub fn template(name: &str, err: &tera::Error) -> Self {
        use std::error::Error;

        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(inner) = source {
            messages.push(inner.to_string());
            source = inner.source();
        }

        Self::Template {
            name: name.to_owned(),
            message: messages.join(" → "),
        }
    }
}

/// Failure while serializing or writing a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("item `{url}` skipped: {reason}")]
    Item { url: String, reason: String },

    #[error("feed source `{0}` matches no group, category or tag")]
    UnknownSource(String),

    #[error("feed serialization failed: {0}")]
    Serialize(String),

    #[error("IO error when writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Missing global resource; aborts the build.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("content root `{0}` not found")]
    MissingContent(PathBuf),

    #[error("layout directory `{0}` not found")]
    MissingLayouts(PathBuf),

    #[error("layout variant `{0}` has no matching layout file")]
    MissingVariant(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("person tag directory `{0}` is not valid JSON")]
    PersonTags(PathBuf, #[source] serde_json::Error),

    #[error("layout `{0}` failed to parse: {1}")]
    Layout(String, String),

    #[error("worker pool failed to start: {0}")]
    Pool(String),
}
