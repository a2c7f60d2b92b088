//! Compiled template registry.
//!
//! A [`TemplateRegistry`] is a set of parsed templates sharing one delimiter
//! pair and one set of helper functions. It is built in one step, either from
//! a directory tree ([`TemplateRegistry::compile`]) or from in-memory sources
//! ([`TemplateRegistry::from_sources`]), and is read-only afterwards.
//!
//! # Naming
//!
//! A template is named after its path relative to the source root, with the
//! extension stripped and `/` as the separator: `users/show.html` registers
//! as `users/show`. When two files differ only by extension, the extension
//! listed first in the allow-list wins.
//!
//! # Default helpers
//!
//! Every registry installs its own placeholders for the render-time helpers,
//! so a template evaluated outside a layout render fails loudly instead of
//! silently printing nothing:
//!
//! | Helper          | Placeholder behavior                  |
//! |-----------------|---------------------------------------|
//! | `yield()`       | error: called with no layout defined  |
//! | `partial(name)` | error: called with no layout defined  |
//! | `currentpage(p)`| `false`                               |
//! | `build_id()`    | `""`                                  |
//! | `flash()`       | `""`                                  |
//!
//! A render replaces these with values bound to the request being served.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Template, UndefinedBehavior, Value};
use serde::Deserialize;

use crate::error::RegistryError;
use crate::walk::{extension_priority, walk_dir};

/// Template extensions recognized when none are configured, in priority order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".html", ".tmpl"];

/// Helper functions shared by every template in a registry, keyed by name.
///
/// ```rust
/// use minijinja::Value;
/// use turbo_render::Helpers;
///
/// let mut helpers = Helpers::new();
/// helpers.insert("shout".into(), Value::from_function(|s: String| s.to_uppercase()));
/// ```
pub type Helpers = BTreeMap<String, Value>;

/// Variable delimiters used by every template in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    /// Opening delimiter.
    pub left: String,
    /// Closing delimiter.
    pub right: String,
}

impl Delimiters {
    /// Creates a delimiter pair.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    fn is_default(&self) -> bool {
        self.left == "{{" && self.right == "}}"
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

/// A set of compiled, named templates.
pub struct TemplateRegistry {
    env: Environment<'static>,
    names: BTreeSet<String>,
}

impl TemplateRegistry {
    /// Compiles every template under `dir`.
    ///
    /// Fails if `dir` does not exist, if any file cannot be read, or if any
    /// template fails to parse.
    pub fn compile(
        dir: &Path,
        extensions: &[String],
        delimiters: &Delimiters,
        helpers: &Helpers,
    ) -> Result<Self, RegistryError> {
        let mut sources = Vec::new();
        for file in walk_dir(dir, extensions)? {
            let source = std::fs::read_to_string(&file.path).map_err(|source| RegistryError::Io {
                path: file.path.clone(),
                source,
            })?;
            sources.push((file.name_with_ext, source));
        }

        let registry = Self::from_sources(sources, extensions, delimiters, helpers)?;
        tracing::debug!(
            dir = %dir.display(),
            templates = registry.len(),
            "compiled template registry"
        );
        Ok(registry)
    }

    /// Compiles templates from `(relative_path, source)` pairs.
    ///
    /// Paths follow the same naming and extension rules as files on disk.
    /// Paths without an allowed extension are skipped.
    pub fn from_sources<I, P, S>(
        sources: I,
        extensions: &[String],
        delimiters: &Delimiters,
        helpers: &Helpers,
    ) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut env = base_environment(delimiters)?;
        for (name, helper) in helpers {
            env.add_global(name.clone(), helper.clone());
        }

        let mut chosen: BTreeMap<String, (usize, String, String)> = BTreeMap::new();
        for (path, source) in sources {
            let path = path.into().replace('\\', "/");
            let Some(priority) = extension_priority(&path, extensions) else {
                tracing::trace!(%path, "skipping file without a template extension");
                continue;
            };
            let name = path[..path.len() - extensions[priority].len()].to_string();

            match chosen.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert((priority, path, source.into()));
                }
                Entry::Occupied(mut slot) => {
                    if priority < slot.get().0 {
                        tracing::trace!(shadowed = %slot.get().1, by = %path, "extension priority");
                        slot.insert((priority, path, source.into()));
                    }
                }
            }
        }

        let mut names = BTreeSet::new();
        for (name, (_, _, source)) in chosen {
            env.add_template_owned(name.clone(), source)
                .map_err(|source| RegistryError::Parse {
                    name: name.clone(),
                    source,
                })?;
            names.insert(name);
        }

        Ok(Self { env, names })
    }

    /// Whether a template named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Looks up a compiled template. `None` is a signal, not an error.
    pub fn lookup(&self, name: &str) -> Option<Template<'_, '_>> {
        if !self.contains(name) {
            return None;
        }
        self.env.get_template(name).ok()
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry holds no templates.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

fn base_environment(delimiters: &Delimiters) -> Result<Environment<'static>, RegistryError> {
    let mut env = Environment::new();

    if !delimiters.is_default() {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(delimiters.left.clone(), delimiters.right.clone())
            .build()
            .map_err(RegistryError::Syntax)?;
        env.set_syntax(syntax);
    }

    // Names carry no extension, so escaping cannot be picked per file type.
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    env.add_global("yield", Value::from_function(no_layout("yield")));
    env.add_global(
        "partial",
        Value::from_function(|_name: String| -> Result<Value, Error> {
            Err(no_layout_error("partial"))
        }),
    );
    env.add_global("currentpage", Value::from_function(|_page: String| false));
    env.add_global("build_id", Value::from_function(String::new));
    env.add_global("flash", Value::from_function(String::new));

    Ok(env)
}

fn no_layout(helper: &'static str) -> impl Fn() -> Result<Value, Error> + Send + Sync + 'static {
    move || Err(no_layout_error(helper))
}

fn no_layout_error(helper: &str) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!("{helper} called with no layout defined"),
    )
}
