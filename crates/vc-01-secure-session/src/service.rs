//! # Session Manager
//!
//! Application service owning every live session by name.
//!
//! A device can hold several independent sessions at once (the vault channel,
//! a device-pairing channel, ...). Each is an explicit `SessionCrypto`
//! behind its own lock; nothing is global.
//!
//! Installing a session under a name that is already taken clears the old
//! key before it is dropped.

use crate::domain::errors::SessionError;
use crate::domain::session::{SessionCrypto, SessionState};
use crate::ports::outbound::{SecureStore, StoredSession};
use parking_lot::RwLock;
use shared_crypto::KeyPair;
use shared_types::{SessionId, SharedClock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// A session shared between the manager and its users.
///
/// Readers encrypt/decrypt; `clear()` needs the write lock.
pub type SharedSession = Arc<RwLock<SessionCrypto>>;

/// Owner of named sessions.
pub struct SessionManager<S: SecureStore> {
    sessions: RwLock<HashMap<String, SharedSession>>,
    store: S,
    clock: SharedClock,
    session_ttl: Duration,
}

impl<S: SecureStore> SessionManager<S> {
    /// Create a manager.
    ///
    /// # Arguments
    /// * `store` - Platform secure store for persisting session keys
    /// * `clock` - Time source for expiry
    /// * `session_ttl` - Lifetime given to sessions created by `handshake`
    pub fn new(store: S, clock: SharedClock, session_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            clock,
            session_ttl,
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Complete a handshake and install the resulting session under `name`.
    ///
    /// `own` is consumed; its private half is wiped when it drops at the end
    /// of this call.
    pub fn handshake(
        &self,
        name: &str,
        session_id: SessionId,
        own: KeyPair,
        peer_public: &[u8],
    ) -> Result<SharedSession, SessionError> {
        let ttl = chrono::Duration::from_std(self.session_ttl)
            .map_err(|e| SessionError::Crypto(format!("session ttl out of range: {e}")))?;
        let expires_at = self.clock.now() + ttl;

        let session = SessionCrypto::from_key_exchange(
            session_id,
            own.private_key(),
            own.public_key(),
            peer_public,
            expires_at,
            self.clock.clone(),
        )?;
        drop(own);

        Ok(self.install(name, session))
    }

    /// Install `session` under `name`, clearing whatever was there before.
    pub fn install(&self, name: &str, session: SessionCrypto) -> SharedSession {
        let session_id = session.session_id().clone();
        let shared = Arc::new(RwLock::new(session));

        let previous = self
            .sessions
            .write()
            .insert(name.to_string(), shared.clone());
        if let Some(previous) = previous {
            previous.write().clear();
            debug!(name, "Replaced session, previous key cleared");
        }

        info!(name, session_id = %session_id, "Session installed");
        shared
    }

    pub fn get(&self, name: &str) -> Option<SharedSession> {
        self.sessions.read().get(name).cloned()
    }

    /// Like [`Self::get`], but a missing session is an error.
    pub fn require(&self, name: &str) -> Result<SharedSession, SessionError> {
        self.get(name)
            .ok_or_else(|| SessionError::NotEstablished(name.to_string()))
    }

    /// Lifecycle state of the session under `name`.
    pub fn state(&self, name: &str) -> SessionState {
        self.get(name)
            .map_or(SessionState::Unestablished, |session| session.read().state())
    }

    pub fn session_names(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Write the session key under `name` to the secure store.
    pub fn persist(&self, name: &str) -> Result<(), SessionError> {
        let session = self.require(name)?;
        let record = {
            let session = session.read();
            StoredSession {
                session_id: session.session_id().clone(),
                session_key: session.export_key_for_storage()?,
                peer_public_key: *session.peer_public_key(),
                expires_at: session.expires_at(),
            }
        };
        self.store.put_session_key(name, record)?;
        debug!(name, "Session key persisted");
        Ok(())
    }

    /// Reinstall a session from the secure store.
    ///
    /// # Returns
    /// - `Ok(Some(session))` - Restored and installed
    /// - `Ok(None)` - Nothing stored under `name`
    ///
    /// # Errors
    /// `SessionExpired` if the stored session has lapsed; the record is
    /// deleted.
    pub fn restore(&self, name: &str) -> Result<Option<SharedSession>, SessionError> {
        let Some(stored) = self.store.get_session_key(name)? else {
            return Ok(None);
        };

        let session = SessionCrypto::from_stored(
            stored.session_id,
            stored.session_key.as_slice(),
            &stored.peer_public_key,
            stored.expires_at,
            self.clock.clone(),
        )?;

        if !session.is_valid() {
            warn!(name, expired_at = %stored.expires_at, "Stored session expired, discarding");
            self.store.delete_session_key(name)?;
            return Err(SessionError::SessionExpired {
                expired_at: stored.expires_at,
            });
        }

        Ok(Some(self.install(name, session)))
    }

    /// Clear and forget the session under `name`, including its stored key.
    pub fn remove(&self, name: &str) -> Result<bool, SessionError> {
        let removed = self.sessions.write().remove(name);
        self.store.delete_session_key(name)?;
        match removed {
            Some(session) => {
                session.write().clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Clear every session and delete every stored key.
    ///
    /// Returns the number of sessions cleared.
    pub fn logout(&self) -> Result<usize, SessionError> {
        let drained: Vec<(String, SharedSession)> = self.sessions.write().drain().collect();
        for (name, session) in &drained {
            session.write().clear();
            self.store.delete_session_key(name)?;
        }
        info!(sessions = drained.len(), "Logged out, all sessions cleared");
        Ok(drained.len())
    }

    /// Long-term key material from the platform store.
    pub fn long_term_key_material(&self) -> Result<Option<Zeroizing<Vec<u8>>>, SessionError> {
        Ok(self.store.get_long_term_key_material()?)
    }
}
