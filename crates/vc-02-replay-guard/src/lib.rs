//! # Replay Guard Subsystem (VC-02)
//!
//! The bus delivers at least once, in no particular order, and anyone on it
//! can re-publish captured bytes. This crate decides, per incoming message,
//! whether it has been seen before, whether it is fresh, and where it falls
//! in its conversation's sequence.
//!
//! ## Checks
//!
//! | Check     | Outcome on failure       | Caller action |
//! |-----------|--------------------------|---------------|
//! | Duplicate | `ReplayVerdict::Duplicate` | discard     |
//! | Freshness | `ReplayVerdict::InvalidTimestamp` | discard |
//! | Sequence  | `SequenceCheck::Replay` / `Gap` | log, caller decides |
//!
//! A message that passes is recorded exactly once, so a second delivery of
//! the same bytes is reported as a duplicate.
//!
//! ## Memory Bound
//!
//! Expired records are swept before every check. If the table is still at
//! its cap, the oldest quarter is evicted. No background timer is needed.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod service;

pub use config::{ConfigError, ReplayGuardConfig};
pub use domain::verdict::{MessageCheck, ReplayVerdict, SequenceCheck, TimestampRejection};
pub use service::ReplayGuard;
