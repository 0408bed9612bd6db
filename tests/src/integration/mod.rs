//! Cross-crate flows: handshake, sealed round trips, persistence and
//! exactly-once resolution under a misbehaving bus.

pub mod e2e_channel;
pub mod exactly_once;
