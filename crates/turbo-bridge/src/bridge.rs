//! The Turbolinks redirect bridge.
//!
//! Requests made by the Turbolinks client script carry a
//! `Turbolinks-Referrer` header. For those requests the bridge adjusts how
//! redirects reach the client:
//!
//! - A redirect answering a `POST` becomes a `200` JavaScript reply that
//!   clears the client cache and starts a client-side visit. Browsers follow
//!   3xx replies to script-issued `POST`s on their own, so the script would
//!   otherwise never see the redirect.
//! - A redirect answering anything else is left alone, but its target is
//!   stored in a short-lived cookie. When the browser arrives at the target,
//!   the bridge turns the cookie into a `Turbolinks-Location` header so the
//!   script records the final URL in history, and expires the cookie.
//!
//! Requests without the marker header pass straight through.

use http::header::{
    HeaderName, InvalidHeaderName, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS,
};
use http::{HeaderValue, Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use turbo_http::{
    expire_cookie, has_request_cookie, is_tls, request_cookie, set_cookie, site_cookie, Handler,
    Request, ResponseWriter,
};

use crate::escape::escape_js;
use crate::interceptor::ResponseInterceptor;

/// Request header sent by the Turbolinks client on every visit it drives.
pub const TURBOLINKS_REFERRER: &str = "Turbolinks-Referrer";

/// Cookie carrying a redirect target across one request hop.
pub const TURBOLINKS_COOKIE: &str = "_turbolinks_location";

/// Response header telling the client which URL to record in history.
pub const TURBOLINKS_LOCATION: &str = "Turbolinks-Location";

/// Errors raised while configuring a bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The configuration could not be deserialized.
    #[error("invalid bridge config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A configured header name is not a valid HTTP header name.
    #[error("invalid header name `{name}`: {source}")]
    HeaderName {
        /// The configured name.
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
}

/// Names the bridge uses on the wire.
///
/// ```rust
/// use turbo_bridge::BridgeConfig;
///
/// let config = BridgeConfig::from_yaml("location_cookie: _nav").unwrap();
/// assert_eq!(config.location_cookie, "_nav");
/// assert_eq!(config.referrer_header, "Turbolinks-Referrer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Request header marking a client-script visit.
    pub referrer_header: String,
    /// Cookie carrying a pending redirect target.
    pub location_cookie: String,
    /// Response header advertising the final location.
    pub location_header: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            referrer_header: TURBOLINKS_REFERRER.to_string(),
            location_cookie: TURBOLINKS_COOKIE.to_string(),
            location_header: TURBOLINKS_LOCATION.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, BridgeError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Sets the marker request header.
    pub fn referrer_header(mut self, name: impl Into<String>) -> Self {
        self.referrer_header = name.into();
        self
    }

    /// Sets the navigation cookie name.
    pub fn location_cookie(mut self, name: impl Into<String>) -> Self {
        self.location_cookie = name.into();
        self
    }

    /// Sets the history-advance response header.
    pub fn location_header(mut self, name: impl Into<String>) -> Self {
        self.location_header = name.into();
        self
    }
}

/// Wraps `handler` in a bridge with the default configuration.
pub fn bridge<H: Handler>(handler: H) -> TurbolinksBridge<H> {
    TurbolinksBridge::new(handler)
}

/// Middleware adapting redirects for the Turbolinks client.
///
/// ```rust
/// use http::StatusCode;
/// use turbo_bridge::bridge;
/// use turbo_http::{handler_fn, redirect, Handler, ResponseRecorder};
///
/// let app = bridge(handler_fn(|w, req| {
///     redirect(w, req, "/", StatusCode::FOUND).ok();
/// }));
///
/// let req = http::Request::builder()
///     .method("POST")
///     .header("Turbolinks-Referrer", "/form")
///     .body(bytes::Bytes::new())
///     .unwrap();
/// let mut rec = ResponseRecorder::new();
/// app.serve(&mut rec, &req);
///
/// assert_eq!(rec.status(), StatusCode::OK);
/// assert_eq!(
///     rec.body_string(),
///     r#"Turbolinks.clearCache();Turbolinks.visit("/", {action: "advance"});"#
/// );
/// ```
#[derive(Debug)]
pub struct TurbolinksBridge<H> {
    inner: H,
    referrer: HeaderName,
    location_header: HeaderName,
    cookie_name: String,
}

impl<H: Handler> TurbolinksBridge<H> {
    /// Wraps `inner` with the default header and cookie names.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            referrer: HeaderName::from_static("turbolinks-referrer"),
            location_header: HeaderName::from_static("turbolinks-location"),
            cookie_name: TURBOLINKS_COOKIE.to_string(),
        }
    }

    /// Wraps `inner` with custom names.
    pub fn with_config(inner: H, config: &BridgeConfig) -> Result<Self, BridgeError> {
        Ok(Self {
            inner,
            referrer: header_name(&config.referrer_header)?,
            location_header: header_name(&config.location_header)?,
            cookie_name: config.location_cookie.clone(),
        })
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn is_client_visit(&self, req: &Request) -> bool {
        req.headers()
            .get(&self.referrer)
            .is_some_and(|v| !v.is_empty())
    }

    fn serve_form_submission(&self, w: &mut dyn ResponseWriter, req: &Request) {
        let mut interceptor = ResponseInterceptor::new(w);
        self.inner.serve(&mut interceptor, req);

        if let Some(location) = interceptor.location().filter(|l| !l.is_empty()) {
            tracing::debug!(%location, "converting form redirect into client visit");

            let headers = interceptor.headers_mut();
            headers.remove(LOCATION);
            headers.remove(CONTENT_LENGTH);
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/javascript"));
            headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            interceptor.set_status(StatusCode::OK);
            interceptor.replace_body(visit_script(&location));
        }

        send(interceptor);
    }

    fn serve_visit(&self, w: &mut dyn ResponseWriter, req: &Request) {
        self.advertise_pending_location(w, req);

        let mut interceptor = ResponseInterceptor::new(w);
        self.inner.serve(&mut interceptor, req);

        if let Some(location) = interceptor.location().filter(|l| !l.is_empty()) {
            let cookie = site_cookie(self.cookie_name.clone(), location)
                .http_only(true)
                .secure(is_tls(req))
                .build();
            if let Err(err) = set_cookie(&mut interceptor, &cookie) {
                tracing::debug!(%err, "could not store redirect target");
            }
        }

        send(interceptor);
    }

    /// Relays a redirect target left by the previous response, then expires
    /// the cookie that carried it.
    fn advertise_pending_location(&self, w: &mut dyn ResponseWriter, req: &Request) {
        let cookie = request_cookie(req, &self.cookie_name);
        if cookie.is_none() && !has_request_cookie(req, &self.cookie_name) {
            return;
        }

        match cookie.map(|c| HeaderValue::from_str(c.value())) {
            Some(Ok(value)) if !value.is_empty() => {
                w.headers_mut().insert(self.location_header.clone(), value);
            }
            _ => tracing::debug!("ignoring unusable navigation cookie"),
        }

        if let Err(err) = expire_cookie(w, &self.cookie_name) {
            tracing::debug!(%err, "could not expire navigation cookie");
        }
    }
}

impl<H: Handler> Handler for TurbolinksBridge<H> {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        if !self.is_client_visit(req) {
            self.inner.serve(w, req);
            return;
        }

        if req.method() == Method::POST {
            self.serve_form_submission(w, req);
        } else {
            self.serve_visit(w, req);
        }
    }
}

/// Script telling the client to drop its cache and visit `location`.
pub fn visit_script(location: &str) -> String {
    format!(
        "Turbolinks.clearCache();Turbolinks.visit(\"{}\", {{action: \"advance\"}});",
        escape_js(location)
    )
}

fn send(interceptor: ResponseInterceptor<'_>) {
    if let Err(err) = interceptor.send() {
        tracing::debug!(%err, "client went away while sending response");
    }
}

fn header_name(name: &str) -> Result<HeaderName, BridgeError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|source| BridgeError::HeaderName {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{COOKIE, SET_COOKIE};
    use turbo_http::{handler_fn, redirect, ResponseRecorder};

    fn redirecting_to(target: &'static str) -> TurbolinksBridge<impl Handler> {
        bridge(handler_fn(move |w, req| {
            redirect(w, req, target, StatusCode::FOUND).unwrap();
        }))
    }

    fn request(method: Method, marker: bool) -> http::request::Builder {
        let builder = http::Request::builder().method(method).uri("/items");
        if marker {
            builder.header(TURBOLINKS_REFERRER, "http://localhost/items")
        } else {
            builder
        }
    }

    // =========================================================================
    // Passthrough
    // =========================================================================

    #[test]
    fn test_without_marker_redirect_passes_through() {
        let app = redirecting_to("/done");
        let req = request(Method::GET, false).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::FOUND);
        assert_eq!(rec.header(LOCATION), Some("/done"));
        assert!(rec.set_cookies().is_empty());
    }

    #[test]
    fn test_without_marker_post_is_not_converted() {
        let app = redirecting_to("/done");
        let req = request(Method::POST, false).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::FOUND);
        assert_eq!(rec.header(CONTENT_TYPE), None);
    }

    #[test]
    fn test_empty_marker_counts_as_absent() {
        let app = redirecting_to("/done");
        let req = http::Request::builder()
            .method(Method::POST)
            .header(TURBOLINKS_REFERRER, "")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::FOUND);
    }

    // =========================================================================
    // POST conversion
    // =========================================================================

    #[test]
    fn test_post_redirect_becomes_visit_script() {
        let app = redirecting_to("/");
        let req = request(Method::POST, true).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.header(CONTENT_TYPE), Some("text/javascript"));
        assert_eq!(rec.header(X_CONTENT_TYPE_OPTIONS), Some("nosniff"));
        assert_eq!(rec.header(LOCATION), None);
        assert_eq!(
            rec.body_string(),
            r#"Turbolinks.clearCache();Turbolinks.visit("/", {action: "advance"});"#
        );
    }

    #[test]
    fn test_post_redirect_target_is_escaped() {
        let app = redirecting_to("/x\");alert(1);//");
        let req = request(Method::POST, true).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(
            rec.body_string(),
            r#"Turbolinks.clearCache();Turbolinks.visit("/x\");alert(1);//", {action: "advance"});"#
        );
    }

    #[test]
    fn test_post_without_redirect_is_untouched() {
        let app = bridge(handler_fn(|w, _req| {
            w.write_head(StatusCode::UNPROCESSABLE_ENTITY);
            w.write_all(b"invalid").unwrap();
        }));
        let req = request(Method::POST, true).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rec.body_string(), "invalid");
    }

    #[test]
    fn test_post_never_sets_navigation_cookie() {
        let app = redirecting_to("/next");
        let req = request(Method::POST, true).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert!(rec.set_cookie(TURBOLINKS_COOKIE).is_none());
    }

    // =========================================================================
    // Navigation cookie
    // =========================================================================

    #[test]
    fn test_get_redirect_sets_navigation_cookie() {
        let app = redirecting_to("/items/1");
        let req = request(Method::GET, true).body(Bytes::new()).unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::FOUND);
        assert_eq!(rec.header(LOCATION), Some("/items/1"));
        let cookie = rec.set_cookie(TURBOLINKS_COOKIE).unwrap();
        assert_eq!(cookie.value(), "/items/1");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_cookie_is_secure_behind_tls_proxy() {
        let app = redirecting_to("/items/1");
        let req = request(Method::GET, true)
            .header("X-Forwarded-Proto", "https")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.set_cookie(TURBOLINKS_COOKIE).unwrap().secure(), Some(true));
    }

    #[test]
    fn test_pending_location_is_advertised_and_expired() {
        let app = bridge(handler_fn(|w, _req| {
            w.write_all(b"page").unwrap();
        }));
        let req = request(Method::GET, true)
            .header(COOKIE, "_turbolinks_location=%2Fitems%2F1")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.header(TURBOLINKS_LOCATION), Some("/items/1"));
        let expired = rec.set_cookie(TURBOLINKS_COOKIE).unwrap();
        assert_eq!(
            expired.max_age(),
            Some(turbo_http::cookie::time::Duration::ZERO)
        );
        assert_eq!(rec.body_string(), "page");
    }

    #[test]
    fn test_unusable_cookie_is_ignored_but_expired() {
        let app = bridge(handler_fn(|w, _req| {
            w.write_all(b"ok").unwrap();
        }));
        let req = request(Method::GET, true)
            .header(COOKIE, "_turbolinks_location=%0Abad")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.header(TURBOLINKS_LOCATION), None);
        assert_eq!(rec.sent_headers().get_all(SET_COOKIE).iter().count(), 1);
    }

    #[test]
    fn test_undecodable_cookie_is_expired() {
        let app = bridge(handler_fn(|w, _req| {
            w.write_all(b"ok").unwrap();
        }));
        let req = request(Method::GET, true)
            .header(COOKIE, "_turbolinks_location=%FF")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.header(TURBOLINKS_LOCATION), None);
        let removal = rec.set_cookie(TURBOLINKS_COOKIE).unwrap();
        assert_eq!(removal.value(), "");
        assert_eq!(rec.next_cookie_header(), None);
    }

    #[test]
    fn test_chained_redirect_replaces_cookie() {
        let app = redirecting_to("/second");
        let req = request(Method::GET, true)
            .header(COOKIE, "_turbolinks_location=%2Ffirst")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();

        app.serve(&mut rec, &req);

        assert_eq!(rec.header(TURBOLINKS_LOCATION), Some("/first"));
        assert_eq!(rec.set_cookie(TURBOLINKS_COOKIE).unwrap().value(), "/second");
        let next = rec.next_cookie_header().unwrap();
        assert!(next.starts_with("_turbolinks_location="));
        assert!(!next.contains(';'));
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn test_custom_names() {
        let config = BridgeConfig::new()
            .referrer_header("X-Visit")
            .location_cookie("_nav")
            .location_header("X-Visit-Location");
        let app = TurbolinksBridge::with_config(
            handler_fn(|w, req| redirect(w, req, "/n", StatusCode::FOUND).unwrap()),
            &config,
        )
        .unwrap();

        let req = http::Request::builder()
            .header("x-visit", "1")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();
        app.serve(&mut rec, &req);
        assert_eq!(rec.set_cookie("_nav").unwrap().value(), "/n");

        let req = http::Request::builder()
            .header("x-visit", "1")
            .header(COOKIE, "_nav=%2Fn")
            .body(Bytes::new())
            .unwrap();
        let mut rec = ResponseRecorder::new();
        app.serve(&mut rec, &req);
        assert_eq!(rec.header("x-visit-location"), Some("/n"));
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let config = BridgeConfig::new().referrer_header("bad header");
        let err = TurbolinksBridge::with_config(handler_fn(|_w, _req| {}), &config).unwrap_err();
        assert!(matches!(err, BridgeError::HeaderName { ref name, .. } if name == "bad header"));
    }

    #[test]
    fn test_config_from_yaml_defaults() {
        let config = BridgeConfig::from_yaml("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert!(BridgeConfig::from_yaml("location_cookie: [1]").is_err());
    }
}
