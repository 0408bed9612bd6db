//! # Domain Layer
//!
//! Session state and the encrypt/decrypt primitives. No I/O.

pub mod errors;
pub mod session;
