//! # Turbo Render - Layout-Aware HTML Templates
//!
//! `turbo-render` compiles a directory of templates into a
//! [`TemplateRegistry`] and renders them into HTTP responses through
//! [`Render`]. A configured layout wraps every full render and pulls the page
//! in with `yield()`; page-specific fragments come in with `partial(name)`.
//!
//! ## Core Concepts
//!
//! - [`TemplateRegistry`]: compiled templates named by relative path
//! - [`Render`]: composes layout and content, writes responses
//! - [`RenderOptions`]: directory, layout, extensions, delimiters, live reload
//! - [`Helpers`]: extra functions shared by every template
//!
//! ## Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use turbo_http::ResponseRecorder;
//! use turbo_render::{Delimiters, Helpers, Render, RenderOptions, TemplateRegistry};
//!
//! let registry = TemplateRegistry::from_sources(
//!     [
//!         ("layout.html", "<body>{{ yield() }}</body>"),
//!         ("users/show.html", "<h1>{{ name }}</h1>"),
//!     ],
//!     &RenderOptions::default().extensions,
//!     &Delimiters::default(),
//!     &Helpers::new(),
//! )
//! .unwrap();
//! let render = Render::from_registry(RenderOptions::new().layout("layout"), registry);
//!
//! #[derive(serde::Serialize)]
//! struct User { name: &'static str }
//!
//! let req = http::Request::new(bytes::Bytes::new());
//! let mut rec = ResponseRecorder::new();
//! render
//!     .html(&mut rec, &req, StatusCode::OK, "users/show", &User { name: "Ada" }, false)
//!     .unwrap();
//!
//! assert_eq!(rec.body_string(), "<body><h1>Ada</h1></body>");
//! ```

mod context;
mod engine;
mod error;
mod options;
mod registry;
pub mod walk;

pub use engine::{Render, Rendered};
pub use error::{RegistryError, RenderError};
pub use options::RenderOptions;
pub use registry::{Delimiters, Helpers, TemplateRegistry, DEFAULT_EXTENSIONS};

pub use minijinja;
