//! Render configuration.
//!
//! [`RenderOptions`] can be built in code or loaded from YAML:
//!
//! ```rust
//! use turbo_render::RenderOptions;
//!
//! let opts = RenderOptions::from_yaml(r#"
//! directory: templates
//! layout: layout
//! live_reload: true
//! "#).unwrap();
//!
//! assert_eq!(opts.layout_name(), Some("layout"));
//! assert_eq!(opts.extensions, vec![".html", ".tmpl"]);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RegistryError, RenderError};
use crate::registry::{Delimiters, DEFAULT_EXTENSIONS};

/// Options for a [`Render`](crate::Render).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Template source root. Empty means the current working directory.
    pub directory: PathBuf,
    /// Layout template name. `None` or empty disables layouts.
    pub layout: Option<String>,
    /// Allowed template extensions, highest priority first.
    pub extensions: Vec<String>,
    /// Variable delimiters.
    pub delimiters: Delimiters,
    /// Recompile every template before each render. Development only.
    pub live_reload: bool,
    /// Value returned by the `build_id()` helper.
    pub build_id: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            layout: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            delimiters: Delimiters::default(),
            live_reload: false,
            build_id: None,
        }
    }
}

impl RenderOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Sets the template source root.
    pub fn directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.directory = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the layout template.
    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(name.into());
        self
    }

    /// Replaces the extension allow-list.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the variable delimiters.
    pub fn delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delimiters = Delimiters::new(left, right);
        self
    }

    /// Enables or disables live reload.
    pub fn live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    /// Sets the build identifier.
    pub fn build_id(mut self, id: impl Into<String>) -> Self {
        self.build_id = Some(id.into());
        self
    }

    /// The layout name, if layouts are enabled.
    pub fn layout_name(&self) -> Option<&str> {
        self.layout.as_deref().filter(|name| !name.is_empty())
    }

    /// The extension allow-list, falling back to the defaults when empty.
    pub fn effective_extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions.clone()
        }
    }

    /// The template source root, resolving an empty path to the working
    /// directory.
    pub fn resolved_directory(&self) -> Result<PathBuf, RegistryError> {
        if !self.directory.as_os_str().is_empty() {
            return Ok(self.directory.clone());
        }
        std::env::current_dir().map_err(|source| RegistryError::Io {
            path: PathBuf::from("."),
            source,
        })
    }
}
