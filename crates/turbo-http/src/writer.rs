//! The synchronous request/response seam.
//!
//! Handlers in this workspace do not build a response value and return it.
//! They write into a [`ResponseWriter`]: headers first, then a status line via
//! [`ResponseWriter::write_head`], then body bytes through [`std::io::Write`].
//! Once the head has been written, header mutations are no longer visible to
//! the client. That write-once rule is what the bridge's interceptor works
//! around, and what [`ResponseRecorder`] enforces so tests observe the same
//! thing a real client would.
//!
//! Server integrations implement [`ResponseWriter`] over their own output
//! stream; tests use [`ResponseRecorder`].

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use cookie::Cookie;
use http::header::{AsHeaderName, SET_COOKIE};
use http::{HeaderMap, Response, StatusCode};

/// Inbound request type used throughout the workspace.
pub type Request = http::Request<Bytes>;

/// Destination for an HTTP response.
///
/// The header map returned by [`headers_mut`](Self::headers_mut) is live until
/// [`write_head`](Self::write_head) is called; afterwards changes are ignored
/// by the underlying transport. Writing body bytes before the head implies a
/// `200 OK` head.
pub trait ResponseWriter: io::Write {
    /// Returns the headers that will be sent with the response.
    fn headers(&self) -> &HeaderMap;

    /// Returns a mutable view of the headers that will be sent with the response.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line and commits the current headers.
    fn write_head(&mut self, status: StatusCode);
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        (**self).write_head(status)
    }
}

/// A request handler.
///
/// Wrap closures with [`handler_fn`] to get a `Handler`.
pub trait Handler: Send + Sync {
    /// Handles one request by writing into `w`.
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        (**self).serve(w, req)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        (**self).serve(w, req)
    }
}

/// A [`Handler`] backed by a closure. Created by [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync,
{
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        (self.f)(w, req)
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`Handler`].
///
/// ```rust
/// use std::io::Write;
/// use turbo_http::{handler_fn, Handler, Request, ResponseRecorder};
///
/// let hello = handler_fn(|w, _req| {
///     w.write_all(b"hello").ok();
/// });
///
/// let mut rec = ResponseRecorder::new();
/// hello.serve(&mut rec, &Request::new(Default::default()));
/// assert_eq!(rec.body_string(), "hello");
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync,
{
    HandlerFn { f }
}

/// In-memory [`ResponseWriter`] that records what a client would receive.
///
/// Headers are snapshotted when the head is written, so mutations made after
/// that point show up in [`headers`](ResponseWriter::headers) but not in
/// [`sent_headers`](Self::sent_headers), mirroring a real connection.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: Vec<u8>,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status sent to the client, `200 OK` if nothing was written yet.
    pub fn status(&self) -> StatusCode {
        self.committed
            .as_ref()
            .map(|(status, _)| *status)
            .unwrap_or(StatusCode::OK)
    }

    /// Whether the head has been written.
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Headers as the client saw them.
    ///
    /// Before the head is written this is the live header map.
    pub fn sent_headers(&self) -> &HeaderMap {
        match &self.committed {
            Some((_, headers)) => headers,
            None => &self.headers,
        }
    }

    /// First sent value of `name`, if it is valid UTF-8.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.sent_headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookies set by the response, in order.
    pub fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.sent_headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|raw| Cookie::parse_encoded(raw.to_owned()).ok())
            .map(Cookie::into_owned)
            .collect()
    }

    /// The last cookie named `name` set by the response.
    pub fn set_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies().into_iter().rev().find(|c| c.name() == name)
    }

    /// The `Cookie` header a browser would send on its next request, given
    /// only the cookies this response set. Removal cookies are left out.
    pub fn next_cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .set_cookies()
            .iter()
            .filter(|c| c.max_age() != Some(cookie::time::Duration::ZERO))
            .map(|c| c.encoded().stripped().to_string())
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the recording into an [`http::Response`].
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let headers = match self.committed {
            Some((_, headers)) => headers,
            None => self.headers,
        };

        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        if let Some((sent, _)) = &self.committed {
            tracing::warn!(%sent, ignored = %status, "superfluous write_head call");
            return;
        }
        self.committed = Some((status, self.headers.clone()));
    }
}

impl io::Write for ResponseRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.committed.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
