//! # Turbo Bridge - Turbolinks Redirect Middleware
//!
//! `turbo-bridge` wraps any [`Handler`](turbo_http::Handler) so that its
//! redirects cooperate with the Turbolinks client script. See
//! [`TurbolinksBridge`] for the protocol, and [`ResponseInterceptor`] for the
//! buffering that makes it possible to rewrite a response after the handler
//! has written it.
//!
//! ```rust
//! use http::StatusCode;
//! use turbo_bridge::{bridge, TURBOLINKS_COOKIE};
//! use turbo_http::{handler_fn, redirect, Handler, ResponseRecorder};
//!
//! let app = bridge(handler_fn(|w, req| {
//!     redirect(w, req, "/inbox", StatusCode::SEE_OTHER).ok();
//! }));
//!
//! let req = http::Request::builder()
//!     .uri("/login")
//!     .header("Turbolinks-Referrer", "/")
//!     .body(bytes::Bytes::new())
//!     .unwrap();
//! let mut rec = ResponseRecorder::new();
//! app.serve(&mut rec, &req);
//!
//! assert_eq!(rec.status(), StatusCode::SEE_OTHER);
//! assert_eq!(rec.set_cookie(TURBOLINKS_COOKIE).unwrap().value(), "/inbox");
//! ```

mod bridge;
mod escape;
mod interceptor;

pub use bridge::{
    bridge, visit_script, BridgeConfig, BridgeError, TurbolinksBridge, TURBOLINKS_COOKIE,
    TURBOLINKS_LOCATION, TURBOLINKS_REFERRER,
};
pub use escape::escape_js;
pub use interceptor::{InterceptState, ResponseInterceptor};
