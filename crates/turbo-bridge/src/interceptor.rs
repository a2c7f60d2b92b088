//! Deferred response writing.
//!
//! A [`ResponseInterceptor`] sits between a handler and the real
//! [`ResponseWriter`]. The handler writes as usual, but the status line and
//! body are held back until [`ResponseInterceptor::send`]. Headers go straight
//! to the real writer's header map, which stays mutable because its head has
//! not been written yet. That lets middleware inspect and rewrite a finished
//! response before the client sees any of it.

use std::io;

use http::header::LOCATION;
use http::{HeaderMap, StatusCode};
use turbo_http::ResponseWriter;

/// Lifecycle of an intercepted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    /// Nothing written yet.
    Idle,
    /// Headers, status or body have been written and are held back.
    Buffering,
    /// The response has been sent to the real writer.
    Flushed,
}

/// Buffers a handler's response until it is explicitly sent.
///
/// [`send`](Self::send) consumes the interceptor, so a response can be sent
/// at most once. Dropping an interceptor that buffered output without sending
/// it discards that output and logs a warning.
pub struct ResponseInterceptor<'w> {
    inner: &'w mut dyn ResponseWriter,
    state: InterceptState,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl<'w> ResponseInterceptor<'w> {
    /// Wraps `inner`. Its head must not have been written yet.
    pub fn new(inner: &'w mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            state: InterceptState::Idle,
            status: None,
            body: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InterceptState {
        self.state
    }

    /// Status recorded by the handler, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Overrides the recorded status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.touch();
        self.status = Some(status);
    }

    /// The `Location` header the handler set, if it is valid text.
    pub fn location(&self) -> Option<String> {
        self.inner
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Body bytes buffered so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Discards the buffered body and replaces it with `body`.
    pub fn replace_body(&mut self, body: impl Into<Vec<u8>>) {
        self.touch();
        self.body = body.into();
    }

    /// Writes the recorded status (`200 OK` if none) and the buffered body to
    /// the real writer.
    pub fn send(mut self) -> io::Result<()> {
        let status = self.status.unwrap_or(StatusCode::OK);
        let body = std::mem::take(&mut self.body);
        self.state = InterceptState::Flushed;

        self.inner.write_head(status);
        if body.is_empty() {
            return Ok(());
        }
        self.inner.write_all(&body)
    }

    fn touch(&mut self) {
        if self.state == InterceptState::Idle {
            self.state = InterceptState::Buffering;
        }
    }
}

impl ResponseWriter for ResponseInterceptor<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.touch();
        self.inner.headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        self.touch();
        match self.status {
            Some(recorded) => {
                tracing::debug!(%recorded, ignored = %status, "superfluous write_head call");
            }
            None => self.status = Some(status),
        }
    }
}

impl io::Write for ResponseInterceptor<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.touch();
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ResponseInterceptor<'_> {
    fn drop(&mut self) {
        if self.state == InterceptState::Buffering {
            tracing::warn!(
                buffered = self.body.len(),
                "intercepted response dropped without being sent"
            );
        }
    }
}

impl std::fmt::Debug for ResponseInterceptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseInterceptor")
            .field("state", &self.state)
            .field("status", &self.status)
            .field("buffered", &self.body.len())
            .finish_non_exhaustive()
    }
}
