//! The render engine.
//!
//! [`Render`] composes a content template into an optional layout and writes
//! the result to a response. Output is always rendered into memory first:
//! nothing reaches the [`ResponseWriter`] until it is known that evaluation
//! succeeded, so a failing template can still turn into a `500` response.
//!
//! # Layouts
//!
//! With a layout configured, a full render evaluates the layout with a
//! `yield()` helper that renders the requested template in place. A partial
//! render (`partial = true`) skips the layout and evaluates the requested
//! template directly.
//!
//! # Helpers
//!
//! | Helper              | Value                                               |
//! |---------------------|-----------------------------------------------------|
//! | `yield()`           | the content template's output (layout only)         |
//! | `partial(name)`     | `name-<page>` if registered, else `name`, else `""` |
//! | `currentpage(path)` | whether `path` is the request path                  |
//! | `build_id()`        | the configured build identifier                     |
//! | `flash()`           | the pending flash message, consumed on read         |

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use minijinja::Value;
use parking_lot::RwLock;
use serde::Serialize;
use turbo_http::{expire_cookie, Request, ResponseWriter, FLASH_COOKIE};

use crate::context::{FlashSlot, RenderScope};
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::registry::{Helpers, TemplateRegistry};

/// Output of a render that has not been written anywhere yet.
#[derive(Debug)]
pub struct Rendered {
    body: String,
    flash_taken: bool,
}

impl Rendered {
    /// The rendered text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether a template consumed the pending flash message.
    pub fn flash_taken(&self) -> bool {
        self.flash_taken
    }

    /// Expires the flash cookie if a template consumed it, then returns the
    /// rendered text.
    pub fn finish(self, w: &mut dyn ResponseWriter) -> String {
        if self.flash_taken {
            if let Err(err) = expire_cookie(w, FLASH_COOKIE) {
                tracing::warn!(%err, "failed to expire flash cookie");
            }
        }
        self.body
    }
}

/// Layout-aware template renderer.
///
/// `Render` is `Send + Sync`; share it between request handlers behind an
/// [`Arc`].
#[derive(Debug)]
pub struct Render {
    options: RenderOptions,
    helpers: Helpers,
    registry: RwLock<Arc<TemplateRegistry>>,
}

impl Render {
    /// Compiles the configured template directory.
    pub fn new(options: RenderOptions) -> Result<Self, RenderError> {
        Self::with_helpers(options, Helpers::new())
    }

    /// Compiles the configured template directory with extra helper
    /// functions available to every template.
    pub fn with_helpers(options: RenderOptions, helpers: Helpers) -> Result<Self, RenderError> {
        let registry = compile(&options, &helpers)?;
        Ok(Self {
            options,
            helpers,
            registry: RwLock::new(Arc::new(registry)),
        })
    }

    /// Wraps an already compiled registry.
    ///
    /// Live reload recompiles from [`RenderOptions::directory`], so a registry
    /// built from in-memory sources should be used with live reload off.
    pub fn from_registry(options: RenderOptions, registry: TemplateRegistry) -> Self {
        Self {
            options,
            helpers: Helpers::new(),
            registry: RwLock::new(Arc::new(registry)),
        }
    }

    /// The options this renderer was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The current registry.
    pub fn registry(&self) -> Arc<TemplateRegistry> {
        Arc::clone(&self.registry.read())
    }

    /// Whether a template named `name` is registered.
    pub fn template_lookup(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    /// Renders `name` and writes it to `w` with `status`.
    ///
    /// On failure a `500` plain-text response carrying the error is written
    /// instead, `status` is never sent, and the error is returned. A
    /// `Content-Type` already set on `w` is kept; otherwise HTML is assumed.
    pub fn html<S: Serialize + ?Sized>(
        &self,
        w: &mut dyn ResponseWriter,
        req: &Request,
        status: StatusCode,
        name: &str,
        data: &S,
        partial: bool,
    ) -> Result<(), RenderError> {
        let rendered = match self.render_to_buffer(req, name, data, partial) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(template = name, %err, "render failed");
                turbo_http::error(w, &err.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
                return Err(err);
            }
        };

        let body = rendered.finish(w);
        if !w.headers().contains_key(CONTENT_TYPE) {
            w.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
        }
        w.write_head(status);
        w.write_all(body.as_bytes())?;
        Ok(())
    }

    /// Renders `name` and returns the text.
    ///
    /// `w` is only touched to expire a flash cookie consumed by the template.
    pub fn string<S: Serialize + ?Sized>(
        &self,
        w: &mut dyn ResponseWriter,
        req: &Request,
        name: &str,
        data: &S,
        partial: bool,
    ) -> Result<String, RenderError> {
        Ok(self.render_to_buffer(req, name, data, partial)?.finish(w))
    }

    /// Renders `name` into memory.
    ///
    /// Fails with [`RenderError::NotFound`] before evaluating anything if
    /// `name`, or the layout a full render needs, is not registered.
    pub fn render_to_buffer<S: Serialize + ?Sized>(
        &self,
        req: &Request,
        name: &str,
        data: &S,
        partial: bool,
    ) -> Result<Rendered, RenderError> {
        let registry = self.prepare()?;
        let layout = self.options.layout_name().filter(|_| !partial);

        for required in std::iter::once(name).chain(layout) {
            if !registry.contains(required) {
                return Err(RenderError::NotFound {
                    name: required.to_string(),
                });
            }
        }

        let flash = Arc::new(FlashSlot::new(turbo_http::peek_flash(req)));
        let scope = RenderScope::new(
            Value::from_serialize(data),
            name,
            req.uri().path(),
            self.options.build_id.as_deref().unwrap_or_default(),
            Arc::clone(&flash),
        );

        let (target, context) = match layout {
            Some(layout) => (layout, scope.for_layout().into_value()),
            None => (name, scope.into_value()),
        };

        let template = registry.lookup(target).ok_or_else(|| RenderError::NotFound {
            name: target.to_string(),
        })?;
        let body = template
            .render(context)
            .map_err(|err| RenderError::template(target, err))?;

        tracing::trace!(template = name, layout = ?layout, bytes = body.len(), "rendered");
        Ok(Rendered {
            body,
            flash_taken: flash.was_taken(),
        })
    }

    /// Redirects to `url` with `302 Found`, first setting `notice` as the
    /// flash message when it is non-empty.
    pub fn redirect(
        &self,
        w: &mut dyn ResponseWriter,
        req: &Request,
        url: &str,
        notice: Option<&str>,
    ) -> Result<(), RenderError> {
        if let Some(message) = notice.filter(|m| !m.is_empty()) {
            turbo_http::set_flash(w, message)?;
        }
        turbo_http::redirect(w, req, url, StatusCode::FOUND)?;
        Ok(())
    }

    /// Sets a flash message for the client's next request.
    pub fn flash(&self, w: &mut dyn ResponseWriter, message: &str) -> Result<(), RenderError> {
        Ok(turbo_http::set_flash(w, message)?)
    }

    /// Takes the pending flash message, expiring its cookie.
    pub fn get_flash(&self, w: &mut dyn ResponseWriter, req: &Request) -> Option<String> {
        turbo_http::take_flash(w, req)
    }

    /// Returns the registry to render with, recompiling it first when live
    /// reload is on.
    fn prepare(&self) -> Result<Arc<TemplateRegistry>, RenderError> {
        if !self.options.live_reload {
            return Ok(self.registry());
        }

        let fresh = Arc::new(compile(&self.options, &self.helpers)?);
        *self.registry.write() = Arc::clone(&fresh);
        Ok(fresh)
    }
}

fn compile(options: &RenderOptions, helpers: &Helpers) -> Result<TemplateRegistry, RenderError> {
    let dir = options.resolved_directory()?;
    Ok(TemplateRegistry::compile(
        &dir,
        &options.effective_extensions(),
        &options.delimiters,
        helpers,
    )?)
}
