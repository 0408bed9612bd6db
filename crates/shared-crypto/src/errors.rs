//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material of the wrong size. Never truncated or padded.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid nonce length
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length in bytes
        expected: usize,
        /// Actual nonce length in bytes
        actual: usize,
    },

    /// The peer's public key is a low-order point (all-zero shared secret).
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Encryption failed
    #[error("Encryption failed")]
    EncryptionFailed,

    /// The authentication tag did not verify (tampered or wrong key).
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// HKDF expansion failed
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
}
