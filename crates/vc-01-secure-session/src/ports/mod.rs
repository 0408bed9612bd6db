//! # Ports Layer
//!
//! - **Outbound (Driven)**: the platform secure store this subsystem persists
//!   session keys to

pub mod outbound;
