//! # Vault Channel Runtime
//!
//! Wires the channel crates into a runnable loopback:
//!
//! - `config/` - `ChannelConfig` with environment overrides
//! - `runtime/` - bus, sessions, replay guards, correlator and a demo vault
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then env)
//! 2. Initialize logging
//! 3. Negotiate a session between the app and vault sides
//! 4. Start the vault responder and the pending-request sweep
//! 5. Issue a `ping` round trip

pub mod config;
pub mod runtime;

pub use config::{ChannelConfig, ConfigError};
pub use runtime::{demo_handler, ChannelRuntime, RuntimeError, VAULT_SESSION};
