//! # Adapters Module
//!
//! Infrastructure adapters implementing the ports.

pub mod memory_store;

pub use memory_store::InMemorySecureStore;
