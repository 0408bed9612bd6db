//! # Vault Channel Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Two-party channel over an in-memory bus
//! ├── exploits/         # Attack simulations
//! │   ├── replay.rs     # Redelivery, stale and future messages
//! │   ├── tampering.rs  # Bit flips, forged and foreign envelopes
//! │   └── session.rs    # Expired, cleared and replaced sessions
//! └── integration/      # Cross-crate flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vc-tests
//!
//! # By category
//! cargo test -p vc-tests integration::
//! cargo test -p vc-tests exploits::
//!
//! # Benchmarks
//! cargo bench -p vc-tests
//! ```

#![allow(dead_code)]

pub mod exploits;
#[cfg(test)]
pub mod fixtures;
pub mod integration;
