//! Bus error types.

use shared_types::SubjectError;
use thiserror::Error;

/// Errors from bus operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// The subject or pattern is malformed.
    #[error("Invalid subject: {0}")]
    InvalidSubject(#[from] SubjectError),

    /// The transport refused or failed to publish.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// The transport refused or failed to subscribe.
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// The bus was shut down.
    #[error("Bus closed")]
    Closed,
}
