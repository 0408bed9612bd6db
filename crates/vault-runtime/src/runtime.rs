//! # Loopback Channel
//!
//! Both ends of a vault channel on one in-memory bus:
//!
//! ```text
//!  app side                                   vault side
//!  SessionManager("vault")                    SessionManager(<namespace>)
//!  ReplayGuard                                ReplayGuard
//!  RequestCorrelator ──► <ns>.forVault.<op> ──► VaultResponder
//!                    ◄── <ns>.forApp.<op>   ◄──
//! ```
//!
//! Each side runs its own half of the X25519 exchange; only public keys
//! cross between them.

use crate::config::{ChannelConfig, ConfigError};
use serde_json::{json, Value};
use shared_bus::{Bus, InMemoryBus};
use shared_crypto::KeyPair;
use shared_types::subjects::vault_subject;
use shared_types::{SessionId, SharedClock, VaultRequest};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;
use vc_01_secure_session::{InMemorySecureStore, SessionError, SessionManager};
use vc_02_replay_guard::ReplayGuard;
use vc_03_request_correlator::{
    CorrelationError, RequestCorrelator, RequestHandler, VaultResponder,
};

/// Session name the app uses for its vault channel.
pub const VAULT_SESSION: &str = "vault";

/// Errors while bringing the channel up.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Handshake failed: {0}")]
    Handshake(#[from] SessionError),

    #[error("Failed to start vault listener: {0}")]
    Listener(#[from] CorrelationError),
}

/// Operations the loopback vault understands.
pub fn demo_handler(clock: SharedClock) -> RequestHandler {
    Arc::new(move |request: &VaultRequest| match request.kind.as_str() {
        "ping" => Ok(json!("pong")),
        "echo" => Ok(request.payload.clone()),
        "time" => Ok(json!(clock.now().to_rfc3339())),
        other => Err(format!("unsupported operation '{other}'")),
    })
}

/// A running loopback channel.
pub struct ChannelRuntime {
    config: ChannelConfig,
    bus: Arc<InMemoryBus>,
    app_sessions: SessionManager<InMemorySecureStore>,
    vault_sessions: SessionManager<InMemorySecureStore>,
    correlator: RequestCorrelator,
    tasks: Vec<JoinHandle<()>>,
}

impl ChannelRuntime {
    /// Validate `config`, negotiate a session and start the vault side.
    pub async fn start(config: ChannelConfig, clock: SharedClock) -> Result<Self, RuntimeError> {
        config.validate()?;

        let bus = Arc::new(InMemoryBus::new());
        let app_sessions =
            SessionManager::new(InMemorySecureStore::new(), clock.clone(), config.session_ttl);
        let vault_sessions =
            SessionManager::new(InMemorySecureStore::new(), clock.clone(), config.session_ttl);

        // Handshake: swap public keys, derive independently
        let session_id = SessionId::generate();
        let app_keys = KeyPair::generate();
        let vault_keys = KeyPair::generate();
        let app_public = *app_keys.public_key();
        let vault_public = *vault_keys.public_key();

        let app_session =
            app_sessions.handshake(VAULT_SESSION, session_id.clone(), app_keys, &vault_public)?;
        let vault_session =
            vault_sessions.handshake(&config.namespace, session_id.clone(), vault_keys, &app_public)?;
        info!(session_id = %session_id, namespace = %config.namespace, "Loopback session negotiated");

        let app_guard = Arc::new(ReplayGuard::new(config.replay.clone(), clock.clone()).map_err(ConfigError::Replay)?);
        let vault_guard = Arc::new(ReplayGuard::new(config.replay.clone(), clock.clone()).map_err(ConfigError::Replay)?);

        let responder = Arc::new(
            VaultResponder::new(bus.clone(), vault_session, clock.clone())
                .with_replay_guard(vault_guard),
        );
        let vault_task = responder
            .serve(
                &vault_subject(&config.namespace, ">"),
                demo_handler(clock.clone()),
            )
            .await?;

        let correlator = RequestCorrelator::new(
            bus.clone(),
            app_session,
            app_guard,
            config.correlator_config(),
            clock,
        );
        let cleanup_task = correlator.spawn_cleanup();

        Ok(Self {
            config,
            bus,
            app_sessions,
            vault_sessions,
            correlator,
            tasks: vec![vault_task, cleanup_task],
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn correlator(&self) -> &RequestCorrelator {
        &self.correlator
    }

    pub fn bus(&self) -> Arc<dyn Bus> {
        self.bus.clone()
    }

    /// Round trip through the vault.
    pub async fn ping(&self) -> Result<Value, CorrelationError> {
        self.correlator.request("ping", json!({})).await
    }

    pub async fn request(&self, operation: &str, payload: Value) -> Result<Value, CorrelationError> {
        self.correlator.request(operation, payload).await
    }

    /// Stop the vault side and clear every session key.
    pub fn shutdown(self) -> Result<(), SessionError> {
        for task in &self.tasks {
            task.abort();
        }
        let cleared = self.app_sessions.logout()? + self.vault_sessions.logout()?;
        info!(
            sessions_cleared = cleared,
            published = self.bus.messages_published(),
            "Channel shut down"
        );
        Ok(())
    }
}
