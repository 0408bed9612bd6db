//! # HKDF-SHA256 Key Derivation
//!
//! Stretches the raw X25519 output into the 32-byte session key.
//!
//! The salt is both public keys in canonical (sorted) order, so the two
//! parties feed HKDF identical input without agreeing on who is "initiator".
//! The info string binds the key to the protocol label and the session id.

use crate::key_agreement::{SharedSecret, KEY_LEN};
use crate::symmetric::SecretKey;
use crate::CryptoError;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Protocol label mixed into every session key derivation.
pub const SESSION_KEY_INFO: &[u8] = b"vault-channel/session-key/v1";

/// Generic HKDF-SHA256 extract-and-expand into `out`.
///
/// # Errors
///
/// `CryptoError::KeyDerivationFailed` if `out` is longer than 255 * 32 bytes.
pub fn hkdf_sha256(ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    hk.expand(info, out)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))
}

/// Derive the session key from a handshake.
///
/// `context` is appended to [`SESSION_KEY_INFO`]; callers pass the session id.
pub fn derive_session_key(
    shared: &SharedSecret,
    own_public: &[u8; KEY_LEN],
    peer_public: &[u8; KEY_LEN],
    context: &[u8],
) -> Result<SecretKey, CryptoError> {
    let (first, second) = if own_public <= peer_public {
        (own_public, peer_public)
    } else {
        (peer_public, own_public)
    };

    let mut salt = [0u8; 2 * KEY_LEN];
    salt[..KEY_LEN].copy_from_slice(first);
    salt[KEY_LEN..].copy_from_slice(second);

    let mut info = Vec::with_capacity(SESSION_KEY_INFO.len() + context.len());
    info.extend_from_slice(SESSION_KEY_INFO);
    info.extend_from_slice(context);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    hkdf_sha256(shared.as_bytes(), &salt, &info, &mut okm[..])?;
    Ok(SecretKey::from_bytes(*okm))
}
