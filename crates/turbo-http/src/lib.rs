//! # Turbo HTTP - Response Writer Seam
//!
//! `turbo-http` is the small HTTP layer the rest of the workspace is written
//! against. It does not run a server. It defines how a handler writes a
//! response and provides the helpers the renderer and the Turbolinks bridge
//! share.
//!
//! ## Core Concepts
//!
//! - [`ResponseWriter`]: headers, then a status line, then body bytes
//! - [`Handler`]: anything that serves a [`Request`] into a writer
//! - [`ResponseRecorder`]: in-memory writer for tests
//! - Cookies: [`request_cookie`], [`set_cookie`], [`expire_cookie`]
//! - Flash messages: [`set_flash`], [`take_flash`]
//! - Canned responses: [`redirect`], [`error`]
//!
//! ## Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use turbo_http::{handler_fn, redirect, Handler, ResponseRecorder};
//!
//! let create = handler_fn(|w, req| {
//!     if let Err(err) = redirect(w, req, "/items/1", StatusCode::FOUND) {
//!         turbo_http::error(w, &err.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
//!     }
//! });
//!
//! let req = http::Request::builder()
//!     .method("POST")
//!     .uri("/items")
//!     .body(bytes::Bytes::new())
//!     .unwrap();
//! let mut rec = ResponseRecorder::new();
//! create.serve(&mut rec, &req);
//!
//! assert_eq!(rec.status(), StatusCode::FOUND);
//! assert_eq!(rec.header("location"), Some("/items/1"));
//! ```

mod cookies;
mod error;
mod flash;
mod response;
mod writer;

pub use cookies::{
    expire_cookie, has_request_cookie, is_tls, request_cookie, set_cookie, site_cookie,
    TlsConnection,
};
pub use error::HttpError;
pub use flash::{peek_flash, set_flash, take_flash, FLASH_COOKIE};
pub use response::{error, redirect};
pub use writer::{handler_fn, Handler, HandlerFn, Request, ResponseRecorder, ResponseWriter};

// Re-exported so downstream crates and their tests name the same versions.
pub use cookie;
pub use http;
