//! Pending Request Store - turns bus responses into awaited call results.
//!
//! Maps request ids to the single-use slot their caller is waiting on.
//!
//! Flow:
//! 1. `call` registers the request id and gets a oneshot receiver
//! 2. `call` publishes the sealed request
//! 3. The response listener opens a response and calls `complete()`
//! 4. `call` awaits the receiver, its deadline, or cancellation
//!
//! Every terminal path (`complete`, `cancel`, `mark_timed_out`, `mark_failed`,
//! `remove_expired`) removes the entry first, so whichever runs first wins
//! and the rest find nothing.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::{RequestId, VaultResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A response delivered to a waiting caller.
#[derive(Debug)]
pub struct CompletedResponse {
    pub response: VaultResponse,
    pub response_time: Duration,
}

/// A pending request waiting for response
struct PendingRequest {
    sender: oneshot::Sender<CompletedResponse>,
    created_at: Instant,
    /// Operation name (for logging)
    operation: String,
    timeout: Duration,
}

/// Statistics for pending request store
#[derive(Debug, Default)]
pub struct PendingStats {
    pub total_registered: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Cancelled explicitly or by the caller dropping its future
    pub total_cancelled: AtomicU64,
    /// Responses that arrived after their request had resolved
    pub total_late_responses: AtomicU64,
    /// Requests that never reached the bus
    pub total_failed: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub late_responses: u64,
    pub failed: u64,
}

impl PendingStats {
    pub fn snapshot(&self) -> PendingStatsSnapshot {
        PendingStatsSnapshot {
            registered: self.total_registered.load(Ordering::Relaxed),
            completed: self.total_completed.load(Ordering::Relaxed),
            timed_out: self.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.total_cancelled.load(Ordering::Relaxed),
            late_responses: self.total_late_responses.load(Ordering::Relaxed),
            failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Table of in-flight requests.
pub struct PendingRequestStore {
    pending: DashMap<RequestId, PendingRequest>,
    default_timeout: Duration,
    stats: Arc<PendingStats>,
}

impl PendingRequestStore {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register `request_id` and get the receiver its response will arrive on.
    ///
    /// Returns `None` if the id is already in flight.
    pub fn register(
        &self,
        request_id: RequestId,
        operation: &str,
        timeout: Option<Duration>,
    ) -> Option<oneshot::Receiver<CompletedResponse>> {
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(request_id) {
            Entry::Occupied(occupied) => {
                warn!(
                    request_id = %occupied.key(),
                    operation,
                    "Request id already pending"
                );
                None
            }
            Entry::Vacant(vacant) => {
                debug!(
                    request_id = %vacant.key(),
                    operation,
                    "Registered pending request"
                );
                vacant.insert(PendingRequest {
                    sender: tx,
                    created_at: Instant::now(),
                    operation: operation.to_string(),
                    timeout: timeout.unwrap_or(self.default_timeout),
                });
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                Some(rx)
            }
        }
    }

    /// Complete a pending request with a response.
    ///
    /// Returns true if a waiting caller received it. An unknown id (never
    /// registered, timed out, cancelled, or already completed) is counted
    /// as a late response and dropped.
    pub fn complete(&self, response: VaultResponse) -> bool {
        let Some((request_id, pending)) = self.pending.remove(&response.id) else {
            self.stats
                .total_late_responses
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                request_id = %response.id,
                "Response for unknown or already resolved request, dropped"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        match pending.sender.send(CompletedResponse {
            response,
            response_time,
        }) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    operation = pending.operation,
                    response_time_ms = response_time.as_millis(),
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // Receiver was dropped (caller went away)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    operation = pending.operation,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Resolve `request_id` as timed out. Returns false if it already resolved.
    pub fn mark_timed_out(&self, request_id: &RequestId) -> bool {
        match self.pending.remove(request_id) {
            Some((_, pending)) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    request_id = %request_id,
                    operation = pending.operation,
                    timeout_ms = pending.timeout.as_millis(),
                    "Request timed out"
                );
                true
            }
            None => false,
        }
    }

    /// Resolve `request_id` as failed to send. Returns false if it already resolved.
    pub fn mark_failed(&self, request_id: &RequestId) -> bool {
        match self.pending.remove(request_id) {
            Some((_, pending)) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    operation = pending.operation,
                    "Pending request failed before publish"
                );
                true
            }
            None => false,
        }
    }

    /// Cancel a pending request. Returns false if it already resolved.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        if let Some((_, pending)) = self.pending.remove(request_id) {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(
                request_id = %request_id,
                operation = pending.operation,
                "Cancelled pending request"
            );
            true
        } else {
            false
        }
    }

    /// Remove requests whose deadline has passed (TTL cleanup).
    ///
    /// Returns the number of requests removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.pending.retain(|id, request| {
            let elapsed = now.duration_since(request.created_at);
            if elapsed > request.timeout {
                warn!(
                    request_id = %id,
                    operation = request.operation,
                    elapsed_ms = elapsed.as_millis(),
                    timeout_ms = request.timeout.as_millis(),
                    "Removing expired pending request"
                );
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Background task to clean up expired requests
pub async fn cleanup_task(store: Arc<PendingRequestStore>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed, "Cleaned up expired pending requests");
        }
    }
}
