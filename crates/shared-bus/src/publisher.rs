//! # Publisher
//!
//! Defines the `Bus` port and the in-memory transport behind it.

use crate::errors::BusError;
use crate::message::BusMessage;
use crate::subscriber::{Subscription, SubscriptionId};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::subjects::validate_publish_subject;
use shared_types::SubjectPattern;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Subject-addressed publish/subscribe transport.
///
/// Implementations make no confidentiality, ordering or exactly-once
/// promises. Everything that matters is enforced above this trait.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publish opaque bytes on a concrete subject.
    ///
    /// # Returns
    ///
    /// The number of subscriptions the message was delivered to.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<usize, BusError>;

    /// Subscribe to every subject matching `pattern`.
    ///
    /// The returned handle unsubscribes itself when dropped.
    async fn subscribe(&self, pattern: &str) -> Result<Subscription, BusError>;

    /// Remove a subscription. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct Route {
    pattern: SubjectPattern,
    sender: mpsc::Sender<BusMessage>,
}

type RouteTable = Arc<RwLock<HashMap<SubscriptionId, Route>>>;

/// In-memory implementation of the bus.
///
/// Each subscription owns a bounded `mpsc` channel. A full channel drops
/// the message for that subscriber only, which matches the lossy delivery
/// of a real broker.
pub struct InMemoryBus {
    routes: RouteTable,
    next_id: AtomicU64,
    messages_published: AtomicU64,
    capacity: usize,
    /// When set, publish and subscribe fail. Used to simulate transport outages.
    offline: AtomicBool,
}

impl InMemoryBus {
    /// Create a new in-memory bus with default per-subscription capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with the given per-subscription capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            messages_published: AtomicU64::new(0),
            capacity: capacity.max(1),
            offline: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.routes.read().len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total publish calls accepted, including ones nobody received.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Toggle simulated transport failure.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBus")
            .field("subscribers", &self.subscriber_count())
            .field("capacity", &self.capacity)
            .field("offline", &self.is_offline())
            .finish()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<usize, BusError> {
        validate_publish_subject(subject)?;
        if self.is_offline() {
            return Err(BusError::PublishFailed("transport offline".to_string()));
        }

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let targets: Vec<(SubscriptionId, mpsc::Sender<BusMessage>)> = self
            .routes
            .read()
            .iter()
            .filter(|(_, route)| route.pattern.matches(subject))
            .map(|(id, route)| (*id, route.sender.clone()))
            .collect();

        let mut delivered = 0;
        for (id, sender) in targets {
            match sender.try_send(BusMessage::new(subject, payload.clone())) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subject, subscription_id = id, "Subscriber lagging, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    self.routes.write().remove(&id);
                }
            }
        }

        if delivered == 0 {
            debug!(subject, "Message published with no receivers");
        } else {
            debug!(subject, receivers = delivered, "Message published");
        }
        Ok(delivered)
    }

    async fn subscribe(&self, pattern: &str) -> Result<Subscription, BusError> {
        let pattern = SubjectPattern::parse(pattern)?;
        if self.is_offline() {
            return Err(BusError::SubscribeFailed("transport offline".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.routes.write().insert(
            id,
            Route {
                pattern: pattern.clone(),
                sender,
            },
        );
        debug!(subscription_id = id, pattern = %pattern, "New subscription created");

        let routes = Arc::downgrade(&self.routes);
        Ok(Subscription::new(id, pattern, receiver, move |id| {
            if let Some(routes) = routes.upgrade() {
                routes.write().remove(&id);
            }
        }))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.routes.write().remove(&id).is_some()
    }
}
