//! Per-render template context.
//!
//! A [`RenderScope`] is the root context of one render call. It exposes the
//! caller's data (as `data`, and key by key when the data is a map) and the
//! helpers bound to the request being served. Helper values are created on
//! lookup and hold their own handle to the scope, so `yield()` can render the
//! content template with the same data while the layout is still being
//! evaluated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use minijinja::value::{Object, Value, ValueKind};
use minijinja::{Error, ErrorKind, State};

/// A flash message that may be read during a render.
#[derive(Debug, Default)]
pub(crate) struct FlashSlot {
    message: Option<String>,
    taken: AtomicBool,
}

impl FlashSlot {
    pub(crate) fn new(message: Option<String>) -> Self {
        Self {
            message,
            taken: AtomicBool::new(false),
        }
    }

    fn take(&self) -> String {
        match &self.message {
            Some(message) => {
                self.taken.store(true, Ordering::Relaxed);
                message.clone()
            }
            None => String::new(),
        }
    }

    /// Whether a template read the pending message.
    pub(crate) fn was_taken(&self) -> bool {
        self.taken.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RenderScope {
    data: Value,
    /// Content template name; also the suffix for page-specific partials.
    page: String,
    /// Whether `yield()` renders `page` in this scope.
    in_layout: bool,
    request_path: String,
    build_id: String,
    flash: Arc<FlashSlot>,
}

impl RenderScope {
    pub(crate) fn new(
        data: Value,
        page: impl Into<String>,
        request_path: impl Into<String>,
        build_id: impl Into<String>,
        flash: Arc<FlashSlot>,
    ) -> Self {
        Self {
            data,
            page: page.into(),
            in_layout: false,
            request_path: request_path.into(),
            build_id: build_id.into(),
            flash,
        }
    }

    /// Binds `yield()` to the content template.
    pub(crate) fn for_layout(mut self) -> Self {
        self.in_layout = true;
        self
    }

    pub(crate) fn into_value(self) -> Value {
        Value::from_object(self)
    }

    fn render_content(&self, state: &State) -> Result<Value, Error> {
        let template = state.env().get_template(&self.page)?;
        let content = RenderScope {
            in_layout: false,
            ..self.clone()
        };
        let body = template.render(content.into_value())?;
        Ok(Value::from_safe_string(body))
    }

    fn render_partial(&self, state: &State, base: &str) -> Result<Value, Error> {
        let candidates = [format!("{base}-{}", self.page), base.to_string()];
        for name in &candidates {
            match state.env().get_template(name) {
                Ok(template) => {
                    let body = template.render(self.clone().into_value())?;
                    return Ok(Value::from_safe_string(body));
                }
                Err(err) if err.kind() == ErrorKind::TemplateNotFound => continue,
                Err(err) => return Err(err),
            }
        }
        tracing::trace!(partial = base, page = %self.page, "no partial found");
        Ok(Value::from_safe_string(String::new()))
    }

    fn data_field(&self, key: &str) -> Option<Value> {
        if self.data.kind() != ValueKind::Map {
            return None;
        }
        self.data.get_attr(key).ok().filter(|v| !v.is_undefined())
    }
}

impl Object for RenderScope {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let key = key.as_str()?;
        let scope = Arc::clone(self);

        match key {
            "data" => Some(self.data.clone()),
            "yield" if self.in_layout => Some(Value::from_function(move |state: &State| {
                scope.render_content(state)
            })),
            "partial" => Some(Value::from_function(move |state: &State, base: String| {
                scope.render_partial(state, &base)
            })),
            "currentpage" => Some(Value::from_function(move |page: String| {
                page == scope.request_path
            })),
            "build_id" => Some(Value::from_function(move || scope.build_id.clone())),
            "flash" => Some(Value::from_function(move || scope.flash.take())),
            _ => self.data_field(key),
        }
    }
}
