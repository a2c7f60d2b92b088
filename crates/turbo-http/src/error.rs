//! Error type for response-writing helpers.

use http::header::InvalidHeaderValue;
use thiserror::Error;

/// Errors raised while building or writing response metadata.
///
/// Most callers in this workspace treat these as non-fatal: the bridge logs
/// them and carries on, since a navigation hint that cannot be encoded is
/// simply not sent.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A value could not be represented as an HTTP header value.
    #[error("invalid value for header `{name}`: {source}")]
    InvalidHeader {
        /// Header the value was destined for.
        name: String,
        #[source]
        source: InvalidHeaderValue,
    },

    /// Writing the response body failed.
    #[error("I/O error writing response: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    pub(crate) fn invalid_header(name: impl Into<String>, source: InvalidHeaderValue) -> Self {
        HttpError::InvalidHeader {
            name: name.into(),
            source,
        }
    }
}
