//! Response listeners.
//!
//! One bus subscription per response subject, shared by every in-flight
//! call waiting on that subject and torn down when the last one resolves.
//!
//! Each delivered message goes through:
//!
//! ```text
//! bytes ─► decode ─► decrypt (session) ─► replay guard ─► pending.complete
//! ```
//!
//! Anything that fails a step is dropped with a log line. The bus is
//! untrusted, so a bad message is never an error for any caller.

use crate::domain::pending::PendingRequestStore;
use parking_lot::Mutex;
use shared_bus::{Bus, BusError, BusMessage};
use shared_types::{EnvelopeCodec, VaultResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vc_01_secure_session::{SessionError, SharedSession};
use vc_02_replay_guard::{MessageCheck, ReplayGuard, ReplayVerdict};

/// What happened to one delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to a waiting caller
    Completed,
    /// Authentic and fresh, but nobody is waiting for it any more
    Late,
    /// Not decodable
    Malformed,
    /// Sealed under another session
    ForeignSession,
    /// Failed authentication or session unusable
    Rejected,
    /// Duplicate or stale according to the replay guard
    Replayed,
}

/// Per-message pipeline from bus bytes to a resolved pending request.
pub struct ResponseRouter {
    session: SharedSession,
    replay_guard: Arc<ReplayGuard>,
    pending: Arc<PendingRequestStore>,
    codec: EnvelopeCodec,
}

impl ResponseRouter {
    pub fn new(
        session: SharedSession,
        replay_guard: Arc<ReplayGuard>,
        pending: Arc<PendingRequestStore>,
        codec: EnvelopeCodec,
    ) -> Self {
        Self {
            session,
            replay_guard,
            pending,
            codec,
        }
    }

    pub fn route(&self, message: &BusMessage) -> RouteOutcome {
        let wire = match self.codec.decode(&message.payload) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(subject = %message.subject, error = %e, "Dropping undecodable message");
                return RouteOutcome::Malformed;
            }
        };

        let opened: Result<VaultResponse, SessionError> =
            self.session.read().decrypt_structured(&wire.envelope);
        let response = match opened {
            Ok(response) => response,
            Err(SessionError::SessionMismatch { actual, .. }) => {
                debug!(subject = %message.subject, session_id = %actual, "Ignoring message for another session");
                return RouteOutcome::ForeignSession;
            }
            Err(e) => {
                warn!(subject = %message.subject, error = %e, "Dropping message that failed to open");
                return RouteOutcome::Rejected;
            }
        };

        // Replay checks run on authenticated fields only
        let mut check = MessageCheck::new(response.replay_key());
        if let Some(timestamp) = response.timestamp {
            check = check.with_timestamp(timestamp);
        }
        if let Some(sequence) = response.sequence {
            check = check.with_sequence(message.subject.as_str(), sequence);
        }
        match self.replay_guard.validate_message(&check) {
            ReplayVerdict::Valid(_) => {}
            verdict => {
                warn!(
                    subject = %message.subject,
                    request_id = %response.id,
                    ?verdict,
                    "Dropping replayed or stale response"
                );
                return RouteOutcome::Replayed;
            }
        }

        if self.pending.complete(response) {
            RouteOutcome::Completed
        } else {
            RouteOutcome::Late
        }
    }
}

struct ActiveListener {
    refs: usize,
    task: JoinHandle<()>,
}

/// Reference-counted listeners keyed by response subject pattern.
pub(crate) struct ListenerRegistry {
    bus: Arc<dyn Bus>,
    router: Arc<ResponseRouter>,
    active: Mutex<HashMap<String, ActiveListener>>,
}

impl ListenerRegistry {
    pub(crate) fn new(bus: Arc<dyn Bus>, router: Arc<ResponseRouter>) -> Self {
        Self {
            bus,
            router,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Make sure a listener runs on `pattern` and hold a reference to it.
    pub(crate) async fn acquire(
        self: &Arc<Self>,
        pattern: &str,
    ) -> Result<ListenerLease, BusError> {
        if self.try_add_ref(pattern) {
            return Ok(self.lease(pattern));
        }

        let mut subscription = self.bus.subscribe(pattern).await?;

        let mut active = self.active.lock();
        if let Some(listener) = active.get_mut(pattern) {
            // Another call subscribed while we were awaiting; ours is dropped
            listener.refs += 1;
        } else {
            let router = self.router.clone();
            let subject = pattern.to_string();
            let task = tokio::spawn(async move {
                while let Some(message) = subscription.recv().await {
                    router.route(&message);
                }
                debug!(pattern = %subject, "Response listener stream ended");
            });
            active.insert(pattern.to_string(), ActiveListener { refs: 1, task });
            debug!(pattern, "Response listener started");
        }
        drop(active);

        Ok(self.lease(pattern))
    }

    fn try_add_ref(&self, pattern: &str) -> bool {
        match self.active.lock().get_mut(pattern) {
            Some(listener) => {
                listener.refs += 1;
                true
            }
            None => false,
        }
    }

    fn lease(self: &Arc<Self>, pattern: &str) -> ListenerLease {
        ListenerLease {
            registry: self.clone(),
            pattern: pattern.to_string(),
        }
    }

    fn release(&self, pattern: &str) {
        let mut active = self.active.lock();
        let Some(listener) = active.get_mut(pattern) else {
            return;
        };
        listener.refs = listener.refs.saturating_sub(1);
        if listener.refs == 0 {
            if let Some(listener) = active.remove(pattern) {
                listener.task.abort();
                debug!(pattern, "Response listener stopped");
            }
        }
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    pub(crate) fn shutdown(&self) {
        for (_, listener) in self.active.lock().drain() {
            listener.task.abort();
        }
    }
}

/// Keeps a listener alive; releasing happens on drop.
pub(crate) struct ListenerLease {
    registry: Arc<ListenerRegistry>,
    pattern: String,
}

impl Drop for ListenerLease {
    fn drop(&mut self) {
        self.registry.release(&self.pattern);
    }
}
