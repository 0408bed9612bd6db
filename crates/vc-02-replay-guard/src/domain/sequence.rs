//! Per-conversation sequence tracking.
//!
//! Concurrent publishers may legitimately skip numbers, so nothing here
//! rejects a message. The result is advisory.

use crate::domain::verdict::SequenceCheck;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Last sequence number seen per conversation key.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last: DashMap<String, i64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `sequence` for `conversation` and advance state.
    ///
    /// The first number seen for a conversation is taken as the baseline.
    pub fn observe(&self, conversation: &str, sequence: i64) -> SequenceCheck {
        match self.last.entry(conversation.to_string()) {
            Entry::Occupied(mut occupied) => Self::advance(occupied.get_mut(), sequence),
            Entry::Vacant(vacant) => {
                vacant.insert(sequence);
                SequenceCheck::First
            }
        }
    }

    fn advance(last: &mut i64, sequence: i64) -> SequenceCheck {
        let expected = last.saturating_add(1);
        if sequence <= *last {
            SequenceCheck::Replay {
                last_seen: *last,
                received: sequence,
            }
        } else if sequence == expected {
            *last = sequence;
            SequenceCheck::InOrder
        } else {
            *last = sequence;
            SequenceCheck::Gap {
                expected,
                received: sequence,
            }
        }
    }

    pub fn last_sequence(&self, conversation: &str) -> Option<i64> {
        self.last.get(conversation).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&self) {
        self.last.clear();
    }
}
