//! # Vault Telemetry
//!
//! Structured logging for the vault channel crates.
//!
//! Library crates only emit `tracing` events; binaries call
//! [`init_logging`] once at startup.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VC_SERVICE_NAME` | `vault-channel` | Service name in log lines |
//! | `VC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `VC_JSON_LOGS` | `false` | One JSON object per line |
//! | `VC_LOG_SOURCE` | `false` | Include file and line |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
