//! Transport error types.
//!
//! This module provides [`TransportError`], the error type for all
//! connection operations. Only [`Connection::read`](crate::Connection::read)
//! can fail; the other lifecycle operations are infallible by design.

use bytes::Bytes;
use http::StatusCode;

/// Errors surfaced by a [`Connection`](crate::Connection).
///
/// The transport performs no retries: every failure is reported exactly
/// once per `read` invocation and the caller owns recovery policy. Note
/// that the write buffer has already been cleared by the time any of these
/// fire, so a retry requires re-writing the payload.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TransportError {
    /// Underlying connection/IO failure (refused, reset, DNS failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status other than 200. The raw response
    /// body is carried as the error payload; it may contain an error
    /// description the upper protocol layer understands.
    #[error("server returned status {status}")]
    Status { status: StatusCode, body: Bytes },

    /// A second `read` was started while one was already in flight.
    #[error("a read is already in flight on this connection")]
    ConcurrentRead,

    /// The HTTP request could not be constructed, e.g. the configured host
    /// does not form a valid URI.
    #[error("request error: {0}")]
    Request(String),
}

impl TransportError {
    /// The HTTP status code, for [`Status`](TransportError::Status) errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw response body carried by a
    /// [`Status`](TransportError::Status) error.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether this error indicates a transient condition that may resolve
    /// by reconnecting and retrying.
    ///
    /// Transport-level failures are retryable; status errors are a protocol
    /// matter and concurrent/request errors are caller bugs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Transport(_))
    }
}
