//! # Turbo - Server-Rendered Pages for Turbolinks
//!
//! `turbo` bundles the pieces a server-rendered application needs to work
//! with the Turbolinks client script:
//!
//! - [`Render`]: layout-aware HTML templates with `yield()`, `partial()`,
//!   `currentpage()`, `build_id()` and `flash()` helpers
//! - [`bridge`]: middleware that turns redirects into client visits
//! - [`ResponseWriter`] and [`Handler`]: the synchronous seam handlers write to
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use turbo::prelude::*;
//!
//! let registry = TemplateRegistry::from_sources(
//!     [("layout.html", "<body>{{ yield() }}</body>"), ("home.html", "hi {{ data }}")],
//!     &RenderOptions::default().extensions,
//!     &Delimiters::default(),
//!     &Helpers::new(),
//! )
//! .unwrap();
//! let render = Arc::new(Render::from_registry(
//!     RenderOptions::new().layout("layout"),
//!     registry,
//! ));
//!
//! let app = bridge(handler_fn(move |w, req| {
//!     if req.method() == http::Method::POST {
//!         render.redirect(w, req, "/", Some("Saved")).ok();
//!     } else {
//!         render.html(w, req, StatusCode::OK, "home", "there", false).ok();
//!     }
//! }));
//!
//! let req = http::Request::new(bytes::Bytes::new());
//! let mut rec = ResponseRecorder::new();
//! app.serve(&mut rec, &req);
//! assert_eq!(rec.body_string(), "<body>hi there</body>");
//! ```

pub mod prelude;

pub use turbo_bridge::{
    bridge, escape_js, visit_script, BridgeConfig, BridgeError, InterceptState,
    ResponseInterceptor, TurbolinksBridge, TURBOLINKS_COOKIE, TURBOLINKS_LOCATION,
    TURBOLINKS_REFERRER,
};
pub use turbo_http::{
    error, expire_cookie, handler_fn, has_request_cookie, is_tls, peek_flash, redirect,
    request_cookie, set_cookie, set_flash, site_cookie, take_flash, Handler, HandlerFn, HttpError,
    Request, ResponseRecorder, ResponseWriter, TlsConnection, FLASH_COOKIE,
};
pub use turbo_render::{
    Delimiters, Helpers, RegistryError, Render, RenderError, RenderOptions, Rendered,
    TemplateRegistry, DEFAULT_EXTENSIONS,
};

pub use turbo_http::http;
pub use turbo_render::minijinja;
