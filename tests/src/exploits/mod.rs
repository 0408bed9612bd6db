//! # Attack Simulations
//!
//! Anyone on the bus can observe, replay, reorder and inject messages.
//! Each test plays that attacker and checks the channel holds.
//!
//! | Attack | Defense |
//! |--------|---------|
//! | Redeliver a captured envelope | Replay guard event-id cache |
//! | Hold an envelope past the window | Timestamp freshness check |
//! | Flip ciphertext, nonce or tag bits | AEAD tag |
//! | Relabel the session id | Session id is associated data |
//! | Forge a response with own keys | Key agreement, AEAD tag |
//! | Use a stolen handle after logout | Key zeroization |

pub mod replay;
pub mod session;
