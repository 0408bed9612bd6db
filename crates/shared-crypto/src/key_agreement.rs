//! # X25519 Key Agreement
//!
//! Ephemeral key pairs and the raw Diffie-Hellman exchange.
//!
//! Both parties, each holding its own private key and the other's public key,
//! derive the identical 32-byte secret. The raw secret is not a key: it must
//! go through [`crate::kdf`] before use.

use crate::CryptoError;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of X25519 private and public keys.
pub const KEY_LEN: usize = 32;

/// An ephemeral X25519 key pair.
///
/// The private scalar is wiped when the pair is dropped or consumed by
/// [`KeyPair::into_shared_secret`].
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a key pair from OS entropy.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Rebuild a key pair from a stored private key.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidKeyLength` unless `private_key` is 32 bytes.
    pub fn from_private_bytes(private_key: &[u8]) -> Result<Self, CryptoError> {
        let secret = secret_from_slice(private_key)?;
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// The public half, safe to send over the wire.
    pub fn public_key(&self) -> &[u8; KEY_LEN] {
        self.public.as_bytes()
    }

    /// Borrow the private scalar.
    pub fn private_key(&self) -> &[u8; KEY_LEN] {
        self.secret.as_bytes()
    }

    /// Derive the shared secret and erase the private half.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` if `peer_public` is not 32 bytes
    /// - `CryptoError::InvalidPublicKey` for a low-order peer point
    pub fn into_shared_secret(self, peer_public: &[u8]) -> Result<SharedSecret, CryptoError> {
        let peer = public_from_slice(peer_public)?;
        diffie_hellman(&self.secret, &peer)
        // `self.secret` zeroizes on drop here
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", self.public.as_bytes())
            .finish_non_exhaustive()
    }
}

/// Raw X25519 output. Wiped on drop; deliberately not `Clone`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; KEY_LEN]);

impl SharedSecret {
    /// Borrow the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Generate a fresh ephemeral key pair.
pub fn generate_key_pair() -> KeyPair {
    KeyPair::generate()
}

/// X25519 scalar multiplication of `own_private` with `peer_public`.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength` if either input is not 32 bytes
/// - `CryptoError::InvalidPublicKey` for a low-order peer point
pub fn derive_shared_secret(
    own_private: &[u8],
    peer_public: &[u8],
) -> Result<SharedSecret, CryptoError> {
    let secret = secret_from_slice(own_private)?;
    let peer = public_from_slice(peer_public)?;
    diffie_hellman(&secret, &peer)
}

fn diffie_hellman(secret: &StaticSecret, peer: &PublicKey) -> Result<SharedSecret, CryptoError> {
    let shared = secret.diffie_hellman(peer);
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidPublicKey);
    }
    Ok(SharedSecret(*shared.as_bytes()))
}

fn check_len(bytes: &[u8]) -> Result<(), CryptoError> {
    if bytes.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn secret_from_slice(bytes: &[u8]) -> Result<StaticSecret, CryptoError> {
    check_len(bytes)?;
    let mut raw = Zeroizing::new([0u8; KEY_LEN]);
    raw.copy_from_slice(bytes);
    Ok(StaticSecret::from(*raw))
}

fn public_from_slice(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    check_len(bytes)?;
    let mut raw = [0u8; KEY_LEN];
    raw.copy_from_slice(bytes);
    Ok(PublicKey::from(raw))
}
