//! # Replay Records
//!
//! Bounded table of processed event ids.
//!
//! Ids are kept in insertion order next to the lookup map, so both the
//! retention sweep and cap eviction pop from the front without scanning.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

/// Seen-id table. Not synchronized; the guard wraps it in a mutex.
#[derive(Debug)]
pub struct ReplayRecords {
    first_seen: HashMap<String, DateTime<Utc>>,
    order: VecDeque<String>,
    retention: Duration,
    max_entries: usize,
}

impl ReplayRecords {
    pub fn new(retention: Duration, max_entries: usize) -> Self {
        Self {
            first_seen: HashMap::new(),
            order: VecDeque::new(),
            retention,
            max_entries: max_entries.max(1),
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.first_seen.contains_key(event_id)
    }

    pub fn first_seen(&self, event_id: &str) -> Option<DateTime<Utc>> {
        self.first_seen.get(event_id).copied()
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    /// Drop records older than the retention period.
    ///
    /// Returns the number removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut removed = 0;
        loop {
            let expired = match self.order.front() {
                Some(id) => self.first_seen.get(id).map_or(true, |seen| *seen <= cutoff),
                None => break,
            };
            if !expired {
                break;
            }
            if let Some(id) = self.order.pop_front() {
                self.first_seen.remove(&id);
                removed += 1;
            }
        }
        removed
    }

    /// If at or over the cap, evict the oldest quarter.
    ///
    /// Returns the number evicted.
    pub fn enforce_cap(&mut self) -> usize {
        if self.first_seen.len() < self.max_entries {
            return 0;
        }
        let target = (self.first_seen.len() / 4).max(1);
        let mut evicted = 0;
        while evicted < target {
            let Some(id) = self.order.pop_front() else {
                break;
            };
            self.first_seen.remove(&id);
            evicted += 1;
        }
        evicted
    }

    /// Record `event_id` as processed at `now`. Returns `false` if already present.
    pub fn insert(&mut self, event_id: &str, now: DateTime<Utc>) -> bool {
        if self.first_seen.contains_key(event_id) {
            return false;
        }
        self.first_seen.insert(event_id.to_string(), now);
        self.order.push_back(event_id.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.first_seen.clear();
        self.order.clear();
    }
}
