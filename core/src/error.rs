//! Error types for the REST request builder.
//!
//! # Design
//! Nothing is recovered locally: every failure is surfaced to the caller with
//! enough context (verb, target) to act on. Transport failures are carried
//! through untouched in `RestError::Transport` so the caller still sees the
//! underlying client's error as the `source()`.

use thiserror::Error;

use crate::http::Verb;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RestError>;

/// Errors returned by `RestRequest` and `RestResponse`.
#[derive(Debug, Error)]
pub enum RestError {
    /// An unrecognized chained operation, or execution without a verb.
    #[error("{message}")]
    Configuration { message: String },

    /// Execution was attempted without a complete user/password pair.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// The server answered with a status outside the verb's accepted set.
    /// `body` holds the raw response bytes verbatim.
    #[error("{verb} {target} failed with status {status}")]
    RequestFailed {
        verb: Verb,
        target: String,
        status: u16,
        body: Vec<u8>,
    },

    /// The response body was present but is not valid JSON.
    #[error("response body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The target could not be parsed as an absolute URL.
    #[error("invalid target {target}: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RestError {
    pub(crate) fn unknown_operation(name: &str) -> Self {
        RestError::Configuration {
            message: format!("unknown operation {name}"),
        }
    }

    /// Status code of a `RequestFailed` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of a `RequestFailed` error.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            RestError::RequestFailed { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Failure raised by a `Transport` while performing the HTTP call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] ureq::Error),

    #[error("malformed request: {0}")]
    Request(#[from] ureq::http::Error),

    /// Any other failure, for transports that do not sit on ureq.
    #[error("{0}")]
    Other(String),
}
