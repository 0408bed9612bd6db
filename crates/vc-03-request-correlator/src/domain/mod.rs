//! # Domain Layer
//!
//! The pending-request table, configuration and error taxonomy.

pub mod config;
pub mod error;
pub mod pending;
