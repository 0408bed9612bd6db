//! In-memory `SecureStore` for tests and the loopback runtime.
//!
//! Holds key material in zeroizing buffers but offers no protection at rest.

use crate::ports::outbound::{SecureStore, StoreError, StoredSession};
use parking_lot::RwLock;
use std::collections::HashMap;
use zeroize::Zeroizing;

/// Process-local secure store.
#[derive(Default)]
pub struct InMemorySecureStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    long_term: RwLock<Option<Zeroizing<Vec<u8>>>>,
}

impl InMemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision long-term key material, as the platform would at enrollment.
    pub fn with_long_term_key_material(material: Vec<u8>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            long_term: RwLock::new(Some(Zeroizing::new(material))),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SecureStore for InMemorySecureStore {
    fn get_session_key(&self, name: &str) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.sessions.read().get(name).map(|stored| StoredSession {
            session_id: stored.session_id.clone(),
            session_key: stored.session_key.clone(),
            peer_public_key: stored.peer_public_key,
            expires_at: stored.expires_at,
        }))
    }

    fn put_session_key(&self, name: &str, session: StoredSession) -> Result<(), StoreError> {
        self.sessions.write().insert(name.to_string(), session);
        Ok(())
    }

    fn delete_session_key(&self, name: &str) -> Result<(), StoreError> {
        self.sessions.write().remove(name);
        Ok(())
    }

    fn get_long_term_key_material(&self) -> Result<Option<Zeroizing<Vec<u8>>>, StoreError> {
        Ok(self.long_term.read().clone())
    }
}

impl std::fmt::Debug for InMemorySecureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySecureStore")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}
