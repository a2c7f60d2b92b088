//! Cookie reading and writing over the [`ResponseWriter`] seam.
//!
//! Values are percent-encoded on the wire, so any string (including a URL
//! with `;` or spaces in it) survives a round trip. Cookies that fail to
//! decode are treated as absent.

use cookie::{Cookie, CookieBuilder};
use http::header::{COOKIE, SET_COOKIE};
use http::uri::Scheme;
use http::HeaderValue;

use crate::error::HttpError;
use crate::writer::{Request, ResponseWriter};

/// Request extension marking a connection that arrived over TLS.
///
/// Servers that terminate TLS themselves insert this into
/// [`http::Request::extensions_mut`]; [`is_tls`] checks for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsConnection;

/// Reports whether the request was made over HTTPS.
///
/// True when the connection carries [`TlsConnection`], the request URI has
/// an `https` scheme, or a TLS-terminating proxy set
/// `X-Forwarded-Proto: https`.
pub fn is_tls(req: &Request) -> bool {
    if req.extensions().get::<TlsConnection>().is_some() {
        return true;
    }
    if req.uri().scheme() == Some(&Scheme::HTTPS) {
        return true;
    }
    req.headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Finds the request cookie named `name`.
pub fn request_cookie(req: &Request, name: &str) -> Option<Cookie<'static>> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse_encoded(raw.to_owned()))
        .filter_map(|parsed| match parsed {
            Ok(cookie) => Some(cookie.into_owned()),
            Err(err) => {
                tracing::trace!(%err, "skipping malformed request cookie");
                None
            }
        })
        .find(|c| c.name() == name)
}

/// Reports whether the request sends a cookie named `name`, even one whose
/// value does not decode.
pub fn has_request_cookie(req: &Request, name: &str) -> bool {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw))
        .any(|parsed| parsed.is_ok_and(|c| c.name() == name))
}

/// Appends a `Set-Cookie` header for `cookie`.
pub fn set_cookie(w: &mut dyn ResponseWriter, cookie: &Cookie<'_>) -> Result<(), HttpError> {
    let value = HeaderValue::from_str(&cookie.encoded().to_string())
        .map_err(|e| HttpError::invalid_header(SET_COOKIE.as_str(), e))?;
    w.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

/// Tells the client to drop the cookie named `name` at path `/`.
pub fn expire_cookie(w: &mut dyn ResponseWriter, name: &str) -> Result<(), HttpError> {
    let mut removal = site_cookie(name, "").build();
    removal.make_removal();
    set_cookie(w, &removal)
}

/// Starts a cookie scoped to the whole site (`Path=/`).
pub fn site_cookie(name: impl Into<String>, value: impl Into<String>) -> CookieBuilder<'static> {
    Cookie::build((name.into(), value.into())).path("/")
}
