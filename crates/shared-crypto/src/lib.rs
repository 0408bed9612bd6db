//! # Shared Crypto - Session Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `key_agreement` | X25519 | Ephemeral handshake, raw shared secret |
//! | `kdf` | HKDF-SHA256 | Shared secret -> session key |
//! | `symmetric` | ChaCha20-Poly1305 | Envelope sealing |
//!
//! ## Security Properties
//!
//! - **X25519**: non-contributory (low-order) peer points are rejected
//! - **ChaCha20-Poly1305**: 256-bit key, 96-bit random nonce, 128-bit tag,
//!   constant-time ARX design
//! - **Zeroization**: private scalars, shared secrets and session keys are
//!   wiped on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod kdf;
pub mod key_agreement;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use kdf::{derive_session_key, hkdf_sha256, SESSION_KEY_INFO};
pub use key_agreement::{derive_shared_secret, generate_key_pair, KeyPair, SharedSecret, KEY_LEN};
pub use symmetric::{decrypt, encrypt, open, seal, Nonce, SecretKey, NONCE_LEN, TAG_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
