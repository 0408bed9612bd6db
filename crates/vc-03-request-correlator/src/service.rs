//! # Request Correlator Service
//!
//! Turns "publish, then wait for the matching response on a subscribed
//! subject" into one awaitable call with a deadline.
//!
//! Every call resolves exactly once: a response, a remote failure, a
//! timeout, or a cancellation. Dropping the call future counts as
//! cancellation and cleans up the same way.

use crate::domain::config::CorrelatorConfig;
use crate::domain::error::CorrelationError;
use crate::domain::pending::{cleanup_task, PendingRequestStore, PendingStatsSnapshot};
use crate::listener::{ListenerRegistry, ResponseRouter};
use serde_json::Value;
use shared_bus::Bus;
use shared_types::subjects::{app_subject, app_wildcard, vault_subject};
use shared_types::{
    EnvelopeCodec, RequestId, RoutingMetadata, SharedClock, VaultRequest, VaultResponse,
    WireEnvelope,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use vc_01_secure_session::SharedSession;
use vc_02_replay_guard::ReplayGuard;

/// Removes the pending entry if the call ends without resolving it.
struct PendingGuard {
    pending: Arc<PendingRequestStore>,
    request_id: RequestId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        // No-op when the call already completed, timed out or was cancelled
        self.pending.cancel(&self.request_id);
    }
}

async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    match cancel {
        Some(mut cancel) => {
            if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
                // Sender gone without cancelling: never fires
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

fn into_result(response: VaultResponse) -> Result<Value, CorrelationError> {
    if response.success {
        Ok(response.result.unwrap_or(Value::Null))
    } else {
        Err(CorrelationError::Remote {
            request_id: response.id,
            message: response
                .error
                .unwrap_or_else(|| "unspecified failure".to_string()),
        })
    }
}

/// Request/response correlation over one session.
///
/// The session handle is shared with the `SessionManager`; if the manager
/// replaces or clears it, calls fail with a session error and a new
/// correlator should be built for the new session.
pub struct RequestCorrelator {
    bus: Arc<dyn Bus>,
    session: SharedSession,
    pending: Arc<PendingRequestStore>,
    listeners: Arc<ListenerRegistry>,
    codec: EnvelopeCodec,
    config: CorrelatorConfig,
    clock: SharedClock,
    /// Last sequence number sent, per request subject
    sequences: DashMap<String, i64>,
}

impl RequestCorrelator {
    pub fn new(
        bus: Arc<dyn Bus>,
        session: SharedSession,
        replay_guard: Arc<ReplayGuard>,
        config: CorrelatorConfig,
        clock: SharedClock,
    ) -> Self {
        let codec = EnvelopeCodec::new();
        let pending = Arc::new(PendingRequestStore::new(config.default_timeout));
        let router = Arc::new(ResponseRouter::new(
            session.clone(),
            replay_guard,
            pending.clone(),
            codec,
        ));
        let listeners = Arc::new(ListenerRegistry::new(bus.clone(), router));

        Self {
            bus,
            session,
            pending,
            listeners,
            codec,
            config,
            clock,
            sequences: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Publish `encrypted_request` and wait for the response to `request_id`.
    ///
    /// # Arguments
    /// * `request_id` - Correlation id echoed back by the vault
    /// * `encrypted_request` - Encoded wire envelope to publish
    /// * `request_subject` - Concrete subject to publish on
    /// * `response_subject` - Subject or pattern the response arrives on
    /// * `timeout` - Deadline for the whole call
    ///
    /// # Returns
    /// The `result` of a successful response (`Value::Null` if absent).
    pub async fn call(
        &self,
        request_id: RequestId,
        encrypted_request: Vec<u8>,
        request_subject: &str,
        response_subject: &str,
        timeout: Duration,
    ) -> Result<Value, CorrelationError> {
        self.execute(
            request_id,
            encrypted_request,
            request_subject,
            response_subject,
            timeout,
            None,
        )
        .await
    }

    /// [`Self::call`] that also resolves as `Cancelled` once `cancel` turns true.
    pub async fn call_with_cancel(
        &self,
        request_id: RequestId,
        encrypted_request: Vec<u8>,
        request_subject: &str,
        response_subject: &str,
        timeout: Duration,
        cancel: watch::Receiver<bool>,
    ) -> Result<Value, CorrelationError> {
        self.execute(
            request_id,
            encrypted_request,
            request_subject,
            response_subject,
            timeout,
            Some(cancel),
        )
        .await
    }

    async fn execute(
        &self,
        request_id: RequestId,
        encrypted_request: Vec<u8>,
        request_subject: &str,
        response_subject: &str,
        timeout: Duration,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Value, CorrelationError> {
        if cancel.as_ref().is_some_and(|c| *c.borrow()) {
            return Err(CorrelationError::Cancelled { request_id });
        }

        // Subscribe before publishing so the response cannot slip past
        let _lease = self
            .listeners
            .acquire(response_subject)
            .await
            .map_err(CorrelationError::subscribe)?;

        let operation = request_subject.rsplit('.').next().unwrap_or(request_subject);
        let rx = self
            .pending
            .register(request_id.clone(), operation, Some(timeout))
            .ok_or_else(|| CorrelationError::DuplicateRequestId(request_id.clone()))?;
        let _guard = PendingGuard {
            pending: self.pending.clone(),
            request_id: request_id.clone(),
        };

        let started = Instant::now();
        if let Err(e) = self.bus.publish(request_subject, encrypted_request).await {
            self.pending.mark_failed(&request_id);
            return Err(CorrelationError::publish(e));
        }
        debug!(request_id = %request_id, subject = request_subject, "Published request");

        let remaining = timeout.saturating_sub(started.elapsed());
        tokio::select! {
            biased;

            completed = rx => match completed {
                Ok(completed) => into_result(completed.response),
                // Sender dropped without a response: removed by the sweep or by id
                Err(_) if started.elapsed() >= timeout => {
                    Err(CorrelationError::Timeout { request_id, timeout })
                }
                Err(_) => Err(CorrelationError::Cancelled { request_id }),
            },
            () = tokio::time::sleep(remaining) => {
                self.pending.mark_timed_out(&request_id);
                Err(CorrelationError::Timeout { request_id, timeout })
            }
            () = cancelled(cancel) => {
                self.pending.cancel(&request_id);
                Err(CorrelationError::Cancelled { request_id })
            }
        }
    }

    fn next_sequence(&self, subject: &str) -> i64 {
        let mut entry = self.sequences.entry(subject.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    fn seal_request(
        &self,
        operation: &str,
        payload: Value,
    ) -> Result<(RequestId, Vec<u8>), CorrelationError> {
        let request_subject = vault_subject(&self.config.namespace, operation);
        let request = VaultRequest::new(operation, payload, self.clock.now())
            .with_sequence(self.next_sequence(&request_subject));

        let envelope = self.session.read().encrypt_structured(&request)?;
        let wire = WireEnvelope::new(envelope).with_routing(
            RoutingMetadata::new(request_subject)
                .with_reply_to(app_subject(&self.config.namespace, operation)),
        );
        let bytes = self.codec.encode(&wire)?;
        Ok((request.id, bytes))
    }

    /// Seal `payload` as an `operation` request and call the vault with
    /// the default timeout.
    pub async fn request(&self, operation: &str, payload: Value) -> Result<Value, CorrelationError> {
        self.request_with(operation, payload, self.config.default_timeout, None)
            .await
    }

    /// [`Self::request`] with an explicit deadline and optional cancellation.
    pub async fn request_with(
        &self,
        operation: &str,
        payload: Value,
        timeout: Duration,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Value, CorrelationError> {
        let (request_id, bytes) = self.seal_request(operation, payload)?;
        self.execute(
            request_id,
            bytes,
            &vault_subject(&self.config.namespace, operation),
            &app_wildcard(&self.config.namespace),
            timeout,
            cancel,
        )
        .await
    }

    /// Spawn the periodic sweep of abandoned pending entries.
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        tokio::spawn(cleanup_task(
            self.pending.clone(),
            self.config.cleanup_interval,
        ))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn stats(&self) -> PendingStatsSnapshot {
        self.pending.stats().snapshot()
    }

    /// Number of response subjects currently listened on.
    pub fn listener_count(&self) -> usize {
        self.listeners.active_count()
    }
}

impl Drop for RequestCorrelator {
    fn drop(&mut self) {
        self.listeners.shutdown();
    }
}
