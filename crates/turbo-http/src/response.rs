//! Canned responses: plain-text errors and redirects.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderValue, Method, StatusCode};

use crate::error::HttpError;
use crate::writer::{Request, ResponseWriter};

/// Writes `message` as a plain-text error response with `status`.
///
/// Any `Content-Length` set earlier is dropped, since the body is replaced.
pub fn error(w: &mut dyn ResponseWriter, message: &str, status: StatusCode) {
    let headers = w.headers_mut();
    headers.remove(CONTENT_LENGTH);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    w.write_head(status);

    if let Err(err) = writeln!(w, "{message}") {
        tracing::debug!(%err, "client went away while writing error body");
    }
}

/// Redirects the client to `url` with `status`.
///
/// A relative `url` (one without a leading `/` or a scheme) is resolved
/// against the directory of the request path. GET requests also receive a
/// short HTML body linking to the target.
pub fn redirect(
    w: &mut dyn ResponseWriter,
    req: &Request,
    url: &str,
    status: StatusCode,
) -> Result<(), HttpError> {
    let location = resolve_location(req, url);
    let value = HeaderValue::from_str(&location)
        .map_err(|e| HttpError::invalid_header(LOCATION.as_str(), e))?;
    w.headers_mut().insert(LOCATION, value);

    let is_get = req.method() == Method::GET;
    if (is_get || req.method() == Method::HEAD) && !w.headers().contains_key(CONTENT_TYPE) {
        w.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }
    w.write_head(status);

    if is_get {
        writeln!(
            w,
            "<a href=\"{}\">{}</a>.",
            escape_html(&location),
            status.canonical_reason().unwrap_or_default()
        )?;
    }
    Ok(())
}

fn resolve_location(req: &Request, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") {
        return url.to_owned();
    }

    let path = req.uri().path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    format!("{dir}{url}")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
