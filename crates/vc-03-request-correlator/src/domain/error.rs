//! Correlation error types.
//!
//! Callers branch on [`CorrelationError::kind`] or
//! [`CorrelationError::is_retryable`], never on the message text.

use shared_bus::BusError;
use shared_types::{CodecError, RequestId};
use std::time::Duration;
use thiserror::Error;
use vc_01_secure_session::SessionError;

/// Broad category of a failure, for mapping to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    Cancelled,
    Transport,
    /// The vault answered with an explicit failure
    Remote,
    /// Sealing, opening or session lifecycle
    Crypto,
    /// Malformed envelope or misuse of the API
    Protocol,
}

/// Errors from a correlated call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// No matching response within the deadline
    #[error("Request {request_id} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        request_id: RequestId,
        timeout: Duration,
    },

    /// The caller cancelled the call
    #[error("Request {request_id} cancelled")]
    Cancelled { request_id: RequestId },

    /// The bus refused the request
    #[error("Transport publish failed: {0}")]
    TransportPublishFailed(String),

    /// The bus refused the response subscription
    #[error("Transport subscribe failed: {0}")]
    TransportSubscribeFailed(String),

    /// The vault returned `success: false`
    #[error("Request {request_id} failed remotely: {message}")]
    Remote {
        request_id: RequestId,
        message: String,
    },

    /// The request id is already in flight
    #[error("Request id {0} is already pending")]
    DuplicateRequestId(RequestId),

    /// Sealing or opening failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Envelope could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CorrelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::TransportPublishFailed(_) | Self::TransportSubscribeFailed(_) => {
                ErrorKind::Transport
            }
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Session(_) => ErrorKind::Crypto,
            Self::DuplicateRequestId(_) | Self::Codec(_) => ErrorKind::Protocol,
        }
    }

    /// Timeouts and transport failures may be retried with caller-chosen
    /// backoff. Crypto failures never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Transport)
    }

    pub(crate) fn publish(err: BusError) -> Self {
        Self::TransportPublishFailed(err.to_string())
    }

    pub(crate) fn subscribe(err: BusError) -> Self {
        Self::TransportSubscribeFailed(err.to_string())
    }
}
