//! # Session Crypto
//!
//! A derived session key plus its lifecycle.
//!
//! Sealing is ChaCha20-Poly1305 with a fresh random 96-bit nonce per call and
//! the session id as associated data, so an envelope lifted into another
//! session fails authentication even if the keys happened to match.

use crate::domain::errors::SessionError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_crypto::{derive_session_key, derive_shared_secret, KeyPair, Nonce, SecretKey, KEY_LEN};
use shared_types::{EncryptedEnvelope, SessionId, SharedClock};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session has been installed yet
    Unestablished,
    /// Usable for encrypt/decrypt
    Established,
    /// `now >= expires_at`
    Expired,
    /// Key material has been wiped
    Cleared,
}

/// An established session.
///
/// `clear()` takes `&mut self`; share a session behind a lock
/// (see [`crate::SharedSession`]) so wiping is serialized against use.
pub struct SessionCrypto {
    session_id: SessionId,
    key: SecretKey,
    peer_public_key: [u8; KEY_LEN],
    expires_at: DateTime<Utc>,
    cleared: bool,
    clock: SharedClock,
}

fn to_key_array(bytes: &[u8]) -> Result<[u8; KEY_LEN], SessionError> {
    bytes
        .try_into()
        .map_err(|_| SessionError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })
}

impl SessionCrypto {
    /// Establish a session from a completed key exchange.
    ///
    /// Runs X25519 on `own_private` and `peer_public`, then HKDF-SHA256 into
    /// the session key. Both sides arrive at the same key because the KDF
    /// salt orders the two public keys canonically.
    ///
    /// # Errors
    /// - `InvalidKeyLength` if any key is not 32 bytes
    /// - `KeyPairMismatch` if `own_public` does not belong to `own_private`
    /// - `InvalidPublicKey` for a low-order peer key
    pub fn from_key_exchange(
        session_id: SessionId,
        own_private: &[u8],
        own_public: &[u8],
        peer_public: &[u8],
        expires_at: DateTime<Utc>,
        clock: SharedClock,
    ) -> Result<Self, SessionError> {
        let own_public = to_key_array(own_public)?;
        let peer_public_key = to_key_array(peer_public)?;

        let own = KeyPair::from_private_bytes(own_private)?;
        if own.public_key() != &own_public {
            return Err(SessionError::KeyPairMismatch);
        }

        let shared = derive_shared_secret(own_private, &peer_public_key)?;
        let key = derive_session_key(
            &shared,
            &own_public,
            &peer_public_key,
            session_id.as_bytes(),
        )?;

        debug!(session_id = %session_id, expires_at = %expires_at, "Session established from key exchange");

        Ok(Self {
            session_id,
            key,
            peer_public_key,
            expires_at,
            cleared: false,
            clock,
        })
    }

    /// Restore a session whose key was persisted by the secure store.
    ///
    /// # Errors
    /// `InvalidKeyLength` if `session_key` or `peer_public` is not 32 bytes.
    pub fn from_stored(
        session_id: SessionId,
        session_key: &[u8],
        peer_public: &[u8],
        expires_at: DateTime<Utc>,
        clock: SharedClock,
    ) -> Result<Self, SessionError> {
        let key = SecretKey::from_slice(session_key)?;
        let peer_public_key = to_key_array(peer_public)?;

        debug!(session_id = %session_id, "Session restored from storage");

        Ok(Self {
            session_id,
            key,
            peer_public_key,
            expires_at,
            cleared: false,
            clock,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn peer_public_key(&self) -> &[u8; KEY_LEN] {
        &self.peer_public_key
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the session is usable at `now`. Pure.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the session is usable right now.
    pub fn is_valid(&self) -> bool {
        !self.cleared && self.is_valid_at(self.clock.now())
    }

    pub fn state(&self) -> SessionState {
        if self.cleared {
            SessionState::Cleared
        } else if self.is_valid_at(self.clock.now()) {
            SessionState::Established
        } else {
            SessionState::Expired
        }
    }

    fn ensure_usable(&self) -> Result<(), SessionError> {
        if self.cleared {
            return Err(SessionError::SessionCleared);
        }
        if !self.is_valid_at(self.clock.now()) {
            return Err(SessionError::SessionExpired {
                expired_at: self.expires_at,
            });
        }
        Ok(())
    }

    /// Seal `plaintext` under a fresh nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, SessionError> {
        self.ensure_usable()?;
        let (ciphertext, nonce) =
            shared_crypto::encrypt(&self.key, plaintext, self.session_id.as_bytes())?;
        Ok(EncryptedEnvelope::new(
            self.session_id.clone(),
            *nonce.as_bytes(),
            ciphertext,
        ))
    }

    /// Open an envelope sealed under this session.
    ///
    /// Either the full authenticated plaintext comes back or an error does.
    ///
    /// # Errors
    /// - `SessionCleared` / `SessionExpired` if the session is unusable
    /// - `SessionMismatch` if the envelope names another session
    /// - `AuthenticationFailure` if the tag does not verify
    pub fn decrypt(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, SessionError> {
        self.ensure_usable()?;
        if envelope.session_id != self.session_id {
            return Err(SessionError::SessionMismatch {
                expected: self.session_id.clone(),
                actual: envelope.session_id.clone(),
            });
        }
        let nonce = Nonce::from_bytes(envelope.nonce);
        let plaintext = shared_crypto::decrypt(
            &self.key,
            &envelope.ciphertext,
            &nonce,
            self.session_id.as_bytes(),
        )?;
        Ok(plaintext)
    }

    /// Serialize `value` as JSON and seal it.
    pub fn encrypt_structured<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<EncryptedEnvelope, SessionError> {
        let plaintext = Zeroizing::new(serde_json::to_vec(value)?);
        self.encrypt(&plaintext)
    }

    /// Open an envelope and deserialize its JSON body.
    pub fn decrypt_structured<T: DeserializeOwned>(
        &self,
        envelope: &EncryptedEnvelope,
    ) -> Result<T, SessionError> {
        let plaintext = Zeroizing::new(self.decrypt(envelope)?);
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Overwrite the key with zeros. Idempotent.
    pub fn clear(&mut self) {
        self.key.zeroize();
        if !self.cleared {
            debug!(session_id = %self.session_id, "Session key cleared");
        }
        self.cleared = true;
    }

    /// Copy of the raw key for the platform store. Wiped when dropped.
    ///
    /// # Errors
    /// `SessionCleared` once the key has been wiped.
    pub fn export_key_for_storage(&self) -> Result<Zeroizing<[u8; KEY_LEN]>, SessionError> {
        if self.cleared {
            return Err(SessionError::SessionCleared);
        }
        Ok(Zeroizing::new(*self.key.as_bytes()))
    }
}

impl std::fmt::Debug for SessionCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCrypto")
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .field("cleared", &self.cleared)
            .finish_non_exhaustive()
    }
}
