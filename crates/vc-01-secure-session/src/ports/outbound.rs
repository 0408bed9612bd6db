//! # Outbound Ports (Driven Ports / SPI)
//!
//! The platform keystore is outside this crate. It only ever sees opaque
//! byte blobs and is responsible for protecting them at rest.

use chrono::{DateTime, Utc};
use shared_crypto::KEY_LEN;
use shared_types::SessionId;
use thiserror::Error;
use zeroize::Zeroizing;

/// Error from the secure store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The platform keystore is locked or unavailable
    #[error("Secure store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be read back
    #[error("Corrupt record for {0}")]
    Corrupt(String),
}

/// Everything needed to bring a session back after a restart.
pub struct StoredSession {
    pub session_id: SessionId,
    pub session_key: Zeroizing<[u8; KEY_LEN]>,
    pub peer_public_key: [u8; KEY_LEN],
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Platform secure storage.
///
/// Records are keyed by the session's name in the `SessionManager`
/// (e.g. `"vault"`, `"pairing"`).
pub trait SecureStore: Send + Sync {
    /// Load a previously persisted session key.
    ///
    /// # Returns
    /// `Ok(None)` when nothing is stored under `name`.
    fn get_session_key(&self, name: &str) -> Result<Option<StoredSession>, StoreError>;

    /// Persist a session key, replacing any previous record.
    fn put_session_key(&self, name: &str, session: StoredSession) -> Result<(), StoreError>;

    /// Delete a persisted session key. Deleting a missing record is not an error.
    fn delete_session_key(&self, name: &str) -> Result<(), StoreError>;

    /// Long-term identity key material provisioned by the platform.
    fn get_long_term_key_material(&self) -> Result<Option<Zeroizing<Vec<u8>>>, StoreError>;
}
