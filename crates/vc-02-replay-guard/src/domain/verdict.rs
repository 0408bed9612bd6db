//! Input and output of a replay check.

use chrono::{DateTime, Utc};

/// What is known about an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCheck {
    pub event_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// `(conversation_key, sequence)`
    pub sequence: Option<(String, i64)>,
}

impl MessageCheck {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp: None,
            sequence: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, conversation: impl Into<String>, sequence: i64) -> Self {
        self.sequence = Some((conversation.into(), sequence));
        self
    }
}

/// Why a timestamp was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampRejection {
    /// Older than the freshness window
    TooOld {
        timestamp: DateTime<Utc>,
        oldest_accepted: DateTime<Utc>,
    },
    /// Further ahead than the clock-skew tolerance
    InFuture {
        timestamp: DateTime<Utc>,
        newest_accepted: DateTime<Utc>,
    },
}

/// Where a message falls in its conversation. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// No sequence number supplied
    NotTracked,
    /// First message seen for the conversation; it seeds the baseline
    First,
    /// Exactly `last + 1`
    InOrder,
    /// Numbers were skipped; state advanced to `received`
    Gap { expected: i64, received: i64 },
    /// `received <= last_seen`; state unchanged
    Replay { last_seen: i64, received: i64 },
}

/// Outcome of [`crate::ReplayGuard::validate_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayVerdict {
    /// Accepted and recorded
    Valid(SequenceCheck),
    /// Event id already processed; discard
    Duplicate,
    /// Stale or from the future; discard
    InvalidTimestamp(TimestampRejection),
}

impl ReplayVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Whether the caller must drop the message.
    pub fn should_discard(&self) -> bool {
        !self.is_valid()
    }

    pub fn sequence(&self) -> Option<SequenceCheck> {
        match self {
            Self::Valid(check) => Some(*check),
            _ => None,
        }
    }
}
