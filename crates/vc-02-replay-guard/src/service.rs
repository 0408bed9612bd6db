//! # Replay Guard Service
//!
//! Combines the seen-id table, the freshness window and sequence tracking
//! into one verdict per message.
//!
//! ## Steps
//!
//! 1. Sweep expired records, then evict the oldest quarter if still at cap
//! 2. Duplicate check
//! 3. Timestamp check (if supplied)
//! 4. Sequence check (if supplied), advisory
//! 5. Record the id
//!
//! Steps 1, 2 and 5 happen under one lock, so two concurrent deliveries of
//! the same id cannot both be accepted.

use crate::config::{ConfigError, ReplayGuardConfig};
use crate::domain::records::ReplayRecords;
use crate::domain::sequence::SequenceTracker;
use crate::domain::verdict::{MessageCheck, ReplayVerdict, SequenceCheck, TimestampRejection};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use shared_types::SharedClock;
use tracing::{debug, warn};

/// Replay protection for one session's inbound traffic.
pub struct ReplayGuard {
    records: Mutex<ReplayRecords>,
    sequences: SequenceTracker,
    freshness_window: Duration,
    max_clock_skew: Duration,
    config: ReplayGuardConfig,
    clock: SharedClock,
}

fn to_chrono(value: std::time::Duration) -> Result<Duration, ConfigError> {
    Duration::from_std(value).map_err(|e| ConfigError::InvalidWindow(e.to_string()))
}

impl ReplayGuard {
    /// Create a guard.
    ///
    /// # Errors
    /// Any `ConfigError` from [`ReplayGuardConfig::validate`].
    pub fn new(config: ReplayGuardConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            records: Mutex::new(ReplayRecords::new(
                to_chrono(config.retention())?,
                config.max_entries,
            )),
            sequences: SequenceTracker::new(),
            freshness_window: to_chrono(config.freshness_window)?,
            max_clock_skew: to_chrono(config.max_clock_skew)?,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &ReplayGuardConfig {
        &self.config
    }

    /// Decide whether `check` describes a message worth processing.
    ///
    /// A `Valid` verdict means the id is now recorded; the same id is a
    /// `Duplicate` until its record expires or is evicted.
    pub fn validate_message(&self, check: &MessageCheck) -> ReplayVerdict {
        let now = self.clock.now();
        let mut records = self.records.lock();

        let swept = records.sweep(now);
        let evicted = records.enforce_cap();
        if evicted > 0 {
            warn!(evicted, swept, "Replay table at capacity, evicted oldest entries");
        }

        if records.contains(&check.event_id) {
            debug!(event_id = %check.event_id, "Duplicate message");
            return ReplayVerdict::Duplicate;
        }

        if let Some(timestamp) = check.timestamp {
            if let Err(rejection) = self.check_timestamp(timestamp, now) {
                warn!(event_id = %check.event_id, ?rejection, "Message timestamp rejected");
                return ReplayVerdict::InvalidTimestamp(rejection);
            }
        }

        let sequence = match &check.sequence {
            Some((conversation, sequence)) => {
                let result = self.sequences.observe(conversation, *sequence);
                match result {
                    SequenceCheck::Gap { expected, received } => {
                        warn!(conversation = %conversation, expected, received, "Sequence gap");
                    }
                    SequenceCheck::Replay {
                        last_seen,
                        received,
                    } => {
                        warn!(conversation = %conversation, last_seen, received, "Sequence replay or reorder");
                    }
                    _ => {}
                }
                result
            }
            None => SequenceCheck::NotTracked,
        };

        records.insert(&check.event_id, now);
        ReplayVerdict::Valid(sequence)
    }

    /// Freshness check alone. Edges are inclusive.
    pub fn check_timestamp(
        &self,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), TimestampRejection> {
        let oldest_accepted = now - self.freshness_window;
        let newest_accepted = now + self.max_clock_skew;

        if timestamp < oldest_accepted {
            return Err(TimestampRejection::TooOld {
                timestamp,
                oldest_accepted,
            });
        }
        if timestamp > newest_accepted {
            return Err(TimestampRejection::InFuture {
                timestamp,
                newest_accepted,
            });
        }
        Ok(())
    }

    /// Whether `event_id` is currently recorded.
    pub fn is_processed(&self, event_id: &str) -> bool {
        self.records.lock().contains(event_id)
    }

    pub fn last_sequence(&self, conversation: &str) -> Option<i64> {
        self.sequences.last_sequence(conversation)
    }

    /// Number of recorded ids.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every record and sequence.
    ///
    /// Only for session teardown; clearing mid-session reopens the replay
    /// window for every message still inside it.
    pub fn reset(&self) {
        let mut records = self.records.lock();
        records.clear();
        self.sequences.clear();
        debug!("Replay guard reset");
    }
}

impl std::fmt::Debug for ReplayGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayGuard")
            .field("records", &self.len())
            .field("conversations", &self.sequences.len())
            .field("config", &self.config)
            .finish()
    }
}
