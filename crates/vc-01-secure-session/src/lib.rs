//! # Secure Session Subsystem (VC-01)
//!
//! Establishes the symmetric channel between the app and the vault and seals
//! every payload that crosses the bus.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): `SessionCrypto` and its lifecycle, no I/O
//! - **Ports Layer** (`ports/`): the `SecureStore` collaborator
//! - **Adapters Layer** (`adapters/`): in-memory store
//! - **Service Layer** (`service.rs`): `SessionManager` owning named sessions
//!
//! ## Lifecycle
//!
//! ```text
//! Unestablished ──from_key_exchange / from_stored──► Established
//!                                                      │       │
//!                                          now >= expires_at   clear()
//!                                                      ▼       ▼
//!                                                   Expired  Cleared
//! ```
//!
//! ## Security Notes
//!
//! - The session key never leaves this crate except through
//!   `export_key_for_storage`, which hands it to the platform store.
//! - Key buffers are zeroed on `clear()` and on drop.
//! - The session id is bound into every ciphertext as associated data.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::InMemorySecureStore;
pub use domain::errors::SessionError;
pub use domain::session::{SessionCrypto, SessionState};
pub use ports::outbound::{SecureStore, StoreError, StoredSession};
pub use service::{SessionManager, SharedSession};
