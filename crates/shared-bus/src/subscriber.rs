//! # Subscriber
//!
//! Defines the subscription side of the bus.

use crate::message::BusMessage;
use shared_types::SubjectPattern;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Handle identifying a subscription on its bus.
pub type SubscriptionId = u64;

type DropHook = Box<dyn FnOnce(SubscriptionId) + Send>;

/// A live subscription.
///
/// When dropped, the subscription is automatically removed from its bus.
pub struct Subscription {
    id: SubscriptionId,
    pattern: SubjectPattern,
    receiver: mpsc::Receiver<BusMessage>,
    on_drop: Option<DropHook>,
}

impl Subscription {
    /// Create a subscription fed by `receiver`.
    ///
    /// `on_drop` runs once when the handle is dropped; transports use it to
    /// deregister the route.
    pub fn new(
        id: SubscriptionId,
        pattern: SubjectPattern,
        receiver: mpsc::Receiver<BusMessage>,
        on_drop: impl FnOnce(SubscriptionId) + Send + 'static,
    ) -> Self {
        Self {
            id,
            pattern,
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn pattern(&self) -> &SubjectPattern {
        &self.pattern
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next message
    /// - `None` - Unsubscribed, or the bus was dropped
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Try to receive the next message without waiting.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hook) = self.on_drop.take() {
            hook(self.id);
        }
        debug!(subscription_id = self.id, pattern = %self.pattern, "Subscription dropped");
    }
}

impl Stream for Subscription {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
