//! Commonly used types, importable in one line:
//!
//! ```rust
//! use turbo::prelude::*;
//! ```

pub use crate::http::StatusCode;
pub use crate::{
    bridge, handler_fn, Delimiters, Handler, Helpers, Render, RenderError, RenderOptions,
    Request, ResponseRecorder, ResponseWriter, TemplateRegistry,
};
