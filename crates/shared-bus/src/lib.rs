//! # Shared Bus - Subject-Addressed Publish/Subscribe
//!
//! The transport every vault feature rides on. The bus itself is untrusted:
//!
//! - delivery is at-least-once and unordered across subscribers
//! - any party on the bus may observe, duplicate or inject messages
//! - subjects are routing hints, not identities
//!
//! ```text
//! ┌──────────────┐  publish("alice.forVault.ping")   ┌──────────────┐
//! │     App      │ ────────────┐                     │    Vault     │
//! │              │             ▼                     │              │
//! └──────────────┘      ┌──────────────┐             └──────────────┘
//!        ↑              │     Bus      │ ────────────────────┘
//!        │              │              │  subscribe("*.forVault.>")
//!        └───────────── └──────────────┘
//!   subscribe("alice.forApp.>")
//! ```
//!
//! Confidentiality, integrity and replay protection are layered on top by
//! the session, replay-guard and correlator crates.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod errors;
pub mod message;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use errors::BusError;
pub use message::BusMessage;
pub use publisher::{Bus, InMemoryBus};
pub use subscriber::{Subscription, SubscriptionId};

/// Maximum messages buffered per subscription before new ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
