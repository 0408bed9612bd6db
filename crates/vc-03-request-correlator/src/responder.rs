//! # Vault Responder
//!
//! The vault side of the channel: open requests arriving on
//! `<ns>.forVault.<op>`, run a handler, seal the answer and publish it on
//! the reply subject.
//!
//! Every response gets a fresh event id, a timestamp and a per-subject
//! sequence number, which is what the app's replay guard checks.

use crate::domain::error::CorrelationError;
use dashmap::DashMap;
use serde_json::Value;
use shared_bus::{Bus, BusMessage};
use shared_types::subjects::validate_publish_subject;
use shared_types::{
    EnvelopeCodec, RoutingMetadata, SharedClock, VaultRequest, VaultResponse, WireEnvelope,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;
use vc_01_secure_session::SharedSession;
use vc_02_replay_guard::{MessageCheck, ReplayGuard, ReplayVerdict};

/// Application logic behind the vault: `Ok(result)` or `Err(message)`.
pub type RequestHandler = Arc<dyn Fn(&VaultRequest) -> Result<Value, String> + Send + Sync>;

/// An opened request and where to answer it.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub request: VaultRequest,
    pub reply_subject: String,
}

/// Serves requests for one session.
pub struct VaultResponder {
    bus: Arc<dyn Bus>,
    session: SharedSession,
    replay_guard: Option<Arc<ReplayGuard>>,
    codec: EnvelopeCodec,
    clock: SharedClock,
    sequences: DashMap<String, i64>,
}

/// `alice.forVault.ping` -> `alice.forApp.ping`
fn default_reply_subject(subject: &str) -> Option<String> {
    let mut tokens: Vec<&str> = subject.split('.').collect();
    let direction = tokens.iter().position(|t| *t == "forVault")?;
    tokens[direction] = "forApp";
    Some(tokens.join("."))
}

impl VaultResponder {
    pub fn new(bus: Arc<dyn Bus>, session: SharedSession, clock: SharedClock) -> Self {
        Self {
            bus,
            session,
            replay_guard: None,
            codec: EnvelopeCodec::new(),
            clock,
            sequences: DashMap::new(),
        }
    }

    /// Drop duplicate and stale requests before they reach the handler.
    #[must_use]
    pub fn with_replay_guard(mut self, guard: Arc<ReplayGuard>) -> Self {
        self.replay_guard = Some(guard);
        self
    }

    /// Decode, open and replay-check a request.
    ///
    /// # Returns
    /// - `Ok(Some(request))` - Authentic, fresh, and answerable
    /// - `Ok(None)` - Replayed, stale, or no usable reply subject
    pub fn open_request(
        &self,
        message: &BusMessage,
    ) -> Result<Option<InboundRequest>, CorrelationError> {
        let wire = self.codec.decode(&message.payload)?;
        let request: VaultRequest = self.session.read().decrypt_structured(&wire.envelope)?;

        if let Some(guard) = &self.replay_guard {
            let mut check = MessageCheck::new(request.id.as_str()).with_timestamp(request.timestamp);
            if let Some(sequence) = request.sequence {
                check = check.with_sequence(message.subject.as_str(), sequence);
            }
            if let verdict @ (ReplayVerdict::Duplicate | ReplayVerdict::InvalidTimestamp(_)) =
                guard.validate_message(&check)
            {
                warn!(request_id = %request.id, ?verdict, "Dropping replayed or stale request");
                return Ok(None);
            }
        }

        let reply_subject = wire
            .routing
            .and_then(|routing| routing.reply_to)
            .filter(|reply_to| validate_publish_subject(reply_to).is_ok())
            .or_else(|| default_reply_subject(&message.subject));
        let Some(reply_subject) = reply_subject else {
            warn!(subject = %message.subject, "No reply subject for request");
            return Ok(None);
        };

        Ok(Some(InboundRequest {
            request,
            reply_subject,
        }))
    }

    fn next_sequence(&self, subject: &str) -> i64 {
        let mut entry = self.sequences.entry(subject.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Stamp, seal and encode `response` for `reply_subject`.
    pub fn seal_response(
        &self,
        response: VaultResponse,
        reply_subject: &str,
    ) -> Result<Vec<u8>, CorrelationError> {
        let mut response = response;
        if response.event_id.is_none() {
            response.event_id = Some(Uuid::new_v4().to_string());
        }
        if response.timestamp.is_none() {
            response.timestamp = Some(self.clock.now());
        }
        if response.sequence.is_none() {
            response.sequence = Some(self.next_sequence(reply_subject));
        }

        let envelope = self.session.read().encrypt_structured(&response)?;
        let wire =
            WireEnvelope::new(envelope).with_routing(RoutingMetadata::new(reply_subject));
        Ok(self.codec.encode(&wire)?)
    }

    /// Seal and publish a response.
    pub async fn respond(
        &self,
        reply_subject: &str,
        response: VaultResponse,
    ) -> Result<usize, CorrelationError> {
        let bytes = self.seal_response(response, reply_subject)?;
        self.bus
            .publish(reply_subject, bytes)
            .await
            .map_err(CorrelationError::publish)
    }

    /// Handle one delivered message end to end.
    ///
    /// Returns `true` if a response was published.
    pub async fn handle(
        &self,
        message: &BusMessage,
        handler: &RequestHandler,
    ) -> Result<bool, CorrelationError> {
        let Some(inbound) = self.open_request(message)? else {
            return Ok(false);
        };

        let response = match handler(&inbound.request) {
            Ok(result) => VaultResponse::success(inbound.request.id.clone(), result),
            Err(error) => VaultResponse::failure(inbound.request.id.clone(), error),
        };
        debug!(
            request_id = %inbound.request.id,
            operation = %inbound.request.kind,
            success = response.success,
            "Answering request"
        );

        self.respond(&inbound.reply_subject, response).await?;
        Ok(true)
    }

    /// Subscribe to `pattern` and answer every request with `handler`.
    ///
    /// Failures on individual messages are logged and skipped.
    pub async fn serve(
        self: Arc<Self>,
        pattern: &str,
        handler: RequestHandler,
    ) -> Result<JoinHandle<()>, CorrelationError> {
        let mut subscription = self
            .bus
            .subscribe(pattern)
            .await
            .map_err(CorrelationError::subscribe)?;

        Ok(tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                if let Err(e) = self.handle(&message, &handler).await {
                    warn!(subject = %message.subject, error = %e, "Failed to answer request");
                }
            }
        }))
    }
}
