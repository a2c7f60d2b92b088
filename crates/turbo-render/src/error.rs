//! Error types for template compilation and rendering.
//!
//! [`RegistryError`] covers building a registry (fatal at startup and on
//! reload). [`RenderError`] covers a single render call and wraps registry
//! failures when live reload recompiles before rendering.

use std::path::PathBuf;

use thiserror::Error;
use turbo_http::HttpError;

/// Errors raised while compiling a [`TemplateRegistry`](crate::TemplateRegistry).
///
/// Any of these aborts construction: a registry is never returned with only
/// some of its templates compiled.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The template source directory does not exist or is not a directory.
    #[error("template directory not found: {}", path.display())]
    DirectoryNotFound {
        /// Directory that was configured.
        path: PathBuf,
    },

    /// A directory or template file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template failed to parse.
    #[error("failed to parse template `{name}`: {source}")]
    Parse {
        /// Registry name of the template.
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// The configured delimiters were rejected by the template engine.
    #[error("invalid template delimiters: {0}")]
    Syntax(#[source] minijinja::Error),
}

/// Errors raised by a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested template (or the configured layout) is not registered.
    #[error("template not found: {name}")]
    NotFound {
        /// The name that was requested.
        name: String,
    },

    /// Evaluating a template failed.
    ///
    /// `name` is the template that raised the error, which may be the content
    /// template rendered through `yield()` rather than the layout.
    #[error("error rendering template `{name}`: {source}")]
    Template {
        /// Template the error originated in.
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Recompiling the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Writing the rendered output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Render options could not be deserialized.
    #[error("invalid render options: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// A response header or cookie could not be written.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl RenderError {
    /// Wraps a template engine error, naming the template it came from.
    ///
    /// Falls back to `target` when the engine did not record a template name.
    pub(crate) fn template(target: &str, source: minijinja::Error) -> Self {
        let name = source.name().unwrap_or(target).to_string();
        RenderError::Template { name, source }
    }

    /// Name of the template this error concerns, if any.
    pub fn template_name(&self) -> Option<&str> {
        match self {
            RenderError::NotFound { name } | RenderError::Template { name, .. } => {
                Some(name.as_str())
            }
            RenderError::Registry(RegistryError::Parse { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }
}
