//! # Error Types
//!
//! Failures of the stateless helpers in this crate.

use thiserror::Error;

/// Errors from encoding or decoding a wire envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The bytes are not a well-formed envelope object.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// A binary field is not valid base64.
    #[error("Invalid base64 in field '{field}'")]
    InvalidBase64 { field: &'static str },

    /// The nonce does not decode to exactly 12 bytes.
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// The envelope has no session id.
    #[error("Envelope has an empty session id")]
    EmptySessionId,

    /// Ciphertext shorter than an authentication tag.
    #[error("Ciphertext too short: {len} bytes")]
    CiphertextTooShort { len: usize },

    /// The payload exceeds the codec's size limit.
    #[error("Envelope too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Wire version not understood by this build.
    #[error("Unsupported envelope version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },
}

/// Errors from subject validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("Subject is empty")]
    Empty,

    /// A token between dots is empty or contains whitespace.
    #[error("Invalid token '{token}' in subject '{subject}'")]
    InvalidToken { subject: String, token: String },

    /// Wildcards are only legal in subscription patterns.
    #[error("Wildcard not allowed in publish subject '{0}'")]
    WildcardNotAllowed(String),

    /// `>` may only appear as the final token.
    #[error("Tail wildcard '>' must be the last token in '{0}'")]
    MisplacedTailWildcard(String),
}
