//! One-shot flash messages carried in a cookie.
//!
//! A message set on one response is readable on the next request that
//! presents the cookie. Reading it with [`take_flash`] expires the cookie, so
//! the message is shown once.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::cookies::{expire_cookie, request_cookie, set_cookie, site_cookie};
use crate::error::HttpError;
use crate::writer::{Request, ResponseWriter};

/// Name of the cookie holding the pending flash message.
pub const FLASH_COOKIE: &str = "_turbo_message";

/// Sets `message` as the flash for the client's next request.
pub fn set_flash(w: &mut dyn ResponseWriter, message: &str) -> Result<(), HttpError> {
    let cookie = site_cookie(FLASH_COOKIE, URL_SAFE.encode(message))
        .http_only(true)
        .build();
    set_cookie(w, &cookie)
}

/// Returns the pending flash message without consuming it.
pub fn peek_flash(req: &Request) -> Option<String> {
    let cookie = request_cookie(req, FLASH_COOKIE)?;
    if cookie.value().is_empty() {
        return None;
    }

    let decoded = match URL_SAFE.decode(cookie.value()) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(%err, "ignoring undecodable flash cookie");
            return None;
        }
    };
    String::from_utf8(decoded).ok()
}

/// Returns the pending flash message and expires its cookie.
pub fn take_flash(w: &mut dyn ResponseWriter, req: &Request) -> Option<String> {
    let message = peek_flash(req)?;
    if let Err(err) = expire_cookie(w, FLASH_COOKIE) {
        tracing::warn!(%err, "failed to expire flash cookie");
    }
    Some(message)
}
