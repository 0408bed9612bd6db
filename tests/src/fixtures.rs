//! Two-party channel fixture.
//!
//! App and vault each run their own `SessionManager` and replay guard and
//! only exchange public keys, the way a real deployment does.

use parking_lot::Mutex;
use serde_json::json;
use shared_bus::{Bus, BusMessage, InMemoryBus, Subscription};
use shared_crypto::KeyPair;
use shared_types::{
    Clock, EnvelopeCodec, ManualClock, SessionId, SharedClock, VaultRequest, WireEnvelope,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vc_01_secure_session::{InMemorySecureStore, SessionManager, SharedSession};
use vc_02_replay_guard::{ReplayGuard, ReplayGuardConfig};
use vc_03_request_correlator::{
    CorrelatorConfig, RequestCorrelator, RequestHandler, VaultResponder,
};

pub const NAMESPACE: &str = "alice";
pub const SESSION_NAME: &str = "vault";
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

/// Both ends of a negotiated channel.
pub struct Channel {
    pub clock: Arc<ManualClock>,
    pub bus: Arc<InMemoryBus>,
    pub app: SessionManager<InMemorySecureStore>,
    pub vault: SessionManager<InMemorySecureStore>,
    pub app_session: SharedSession,
    pub vault_session: SharedSession,
    pub app_guard: Arc<ReplayGuard>,
    pub vault_guard: Arc<ReplayGuard>,
}

impl Channel {
    pub fn negotiate() -> Self {
        let clock = ManualClock::starting_now();
        let shared: SharedClock = clock.clone();
        let app = SessionManager::new(InMemorySecureStore::new(), shared.clone(), SESSION_TTL);
        let vault = SessionManager::new(InMemorySecureStore::new(), shared.clone(), SESSION_TTL);
        let (app_session, vault_session, _) = handshake(&app, &vault);

        Self {
            app_guard: Arc::new(ReplayGuard::new(ReplayGuardConfig::default(), shared.clone()).unwrap()),
            vault_guard: Arc::new(ReplayGuard::new(ReplayGuardConfig::default(), shared).unwrap()),
            app_session,
            vault_session,
            clock,
            bus: Arc::new(InMemoryBus::new()),
            app,
            vault,
        }
    }

    pub fn clock(&self) -> SharedClock {
        self.clock.clone()
    }

    /// Run a fresh key exchange on both sides, replacing the current session.
    pub fn rehandshake(&mut self) -> SessionId {
        let (app_session, vault_session, session_id) = handshake(&self.app, &self.vault);
        self.app_session = app_session;
        self.vault_session = vault_session;
        session_id
    }

    pub fn correlator(&self) -> RequestCorrelator {
        self.correlator_for(self.app_session.clone())
    }

    pub fn correlator_for(&self, session: SharedSession) -> RequestCorrelator {
        RequestCorrelator::new(
            self.bus.clone(),
            session,
            self.app_guard.clone(),
            CorrelatorConfig::new(NAMESPACE).with_default_timeout(Duration::from_secs(5)),
            self.clock(),
        )
    }

    pub fn responder(&self) -> Arc<VaultResponder> {
        Arc::new(
            VaultResponder::new(self.bus.clone(), self.vault_session.clone(), self.clock())
                .with_replay_guard(self.vault_guard.clone()),
        )
    }

    /// Start a vault answering every `<ns>.forVault.>` request with `handler`.
    pub async fn serve(&self, handler: RequestHandler) -> JoinHandle<()> {
        self.responder()
            .serve(&format!("{NAMESPACE}.forVault.>"), handler)
            .await
            .unwrap()
    }

    /// Passive observer on `pattern`, as any other bus participant could be.
    pub async fn tap(&self, pattern: &str) -> Subscription {
        self.bus.subscribe(pattern).await.unwrap()
    }

    /// `request` sealed by the app side, as it would appear on the bus.
    pub fn sealed_request(&self, request: &VaultRequest) -> BusMessage {
        let envelope = self.app_session.read().encrypt_structured(request).unwrap();
        let bytes = EnvelopeCodec::new()
            .encode(&WireEnvelope::new(envelope))
            .unwrap();
        BusMessage::new(format!("{NAMESPACE}.forVault.{}", request.kind), bytes)
    }

    pub fn request(&self, operation: &str) -> VaultRequest {
        VaultRequest::new(operation, json!({}), self.clock.now())
    }
}

/// Key exchange where only public keys cross between the two managers.
fn handshake(
    app: &SessionManager<InMemorySecureStore>,
    vault: &SessionManager<InMemorySecureStore>,
) -> (SharedSession, SharedSession, SessionId) {
    let session_id = SessionId::generate();
    let app_keys = KeyPair::generate();
    let vault_keys = KeyPair::generate();
    let app_public = *app_keys.public_key();
    let vault_public = *vault_keys.public_key();

    let app_session = app
        .handshake(SESSION_NAME, session_id.clone(), app_keys, &vault_public)
        .unwrap();
    let vault_session = vault
        .handshake(NAMESPACE, session_id.clone(), vault_keys, &app_public)
        .unwrap();
    (app_session, vault_session, session_id)
}

/// Handler that counts how many times the vault executed anything.
pub fn counting_handler() -> (RequestHandler, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler: RequestHandler = Arc::new(move |request: &VaultRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        match request.kind.as_str() {
            "ping" => Ok(json!("pong")),
            "echo" => Ok(request.payload.clone()),
            other => Err(format!("{other} denied")),
        }
    });
    (handler, calls)
}

/// Collects everything published on a tap.
pub struct Recorder {
    pub messages: Arc<Mutex<Vec<BusMessage>>>,
    task: JoinHandle<()>,
}

impl Recorder {
    pub fn start(mut subscription: Subscription) -> Self {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                sink.lock().push(message);
            }
        });
        Self { messages, task }
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn first(&self) -> Option<BusMessage> {
        self.messages.lock().first().cloned()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll `condition` for up to a second.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
