//! Error types for the fetch client.
//!
//! # Design
//! Every failure of a call lands in one `FetchError` returned through the
//! call's `ResponseOutcome`. `MalformedTarget`, `InvalidHeader` and
//! `Serialization` are produced while preparing the request, before any
//! socket is opened. `Connection` and `Decode` come from the exchange itself,
//! and `Timeout` only exists when the caller configured one.

use std::time::Duration;

use bytes::Bytes;

/// Boxed transport error kept as the source of `FetchError::Connection`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single call: the decoded value or the reason there is none.
pub type ResponseOutcome<T> = Result<T, FetchError>;

/// Errors returned by `FetchClient` calls.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The target URL could not be parsed or does not name a host.
    #[error("malformed target `{target}`: {reason}")]
    MalformedTarget { target: String, reason: String },

    /// A caller-supplied header name or value is not valid on the wire.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The connection could not be opened or broke before the response
    /// finished (refused, reset, DNS, TLS, abrupt close).
    #[error("connection failed: {0}")]
    Connection(#[source] BoxError),

    /// The response arrived in full but is not valid JSON for the expected
    /// type. `body` is the raw buffer as received.
    #[error("decoding {status} response failed: {source}")]
    Decode {
        status: u16,
        body: Bytes,
        #[source]
        source: serde_json::Error,
    },

    /// The configured call timeout elapsed before the outcome was known.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    pub(crate) fn connection(err: impl Into<BoxError>) -> Self {
        FetchError::Connection(err.into())
    }

    pub(crate) fn malformed(target: &str, reason: impl ToString) -> Self {
        FetchError::MalformedTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures detected before any connection was attempted.
    pub fn is_before_io(&self) -> bool {
        matches!(
            self,
            FetchError::MalformedTarget { .. }
                | FetchError::InvalidHeader { .. }
                | FetchError::Serialization(_)
        )
    }
}
