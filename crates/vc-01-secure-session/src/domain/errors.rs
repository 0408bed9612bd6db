//! # Session Errors
//!
//! Every failure is fatal to the single operation that raised it and is
//! never worth retrying: a tampered ciphertext stays tampered.

use crate::ports::outbound::StoreError;
use chrono::{DateTime, Utc};
use shared_crypto::CryptoError;
use shared_types::SessionId;
use thiserror::Error;

/// Errors from session establishment and use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Key material of the wrong size (caller contract violation)
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The peer offered a low-order public key
    #[error("Invalid peer public key")]
    InvalidPublicKey,

    /// `own_public` is not the public half of `own_private`
    #[error("Own public key does not match own private key")]
    KeyPairMismatch,

    /// The AEAD tag did not verify (tampered or truncated ciphertext)
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// The envelope was sealed under a different session
    #[error("Session mismatch: expected {expected}, got {actual}")]
    SessionMismatch {
        expected: SessionId,
        actual: SessionId,
    },

    /// The session passed its expiry instant
    #[error("Session expired at {expired_at}")]
    SessionExpired { expired_at: DateTime<Utc> },

    /// The session key was wiped
    #[error("Session cleared")]
    SessionCleared,

    /// Structured payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other primitive failure (encryption, key derivation)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No session is installed under this name
    #[error("No session named {0}")]
    NotEstablished(String),

    /// The secure store failed
    #[error("Secure store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength { expected, actual } => {
                Self::InvalidKeyLength { expected, actual }
            }
            CryptoError::InvalidPublicKey => Self::InvalidPublicKey,
            CryptoError::AuthenticationFailure => Self::AuthenticationFailure,
            other => Self::Crypto(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
