//! Correlator configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Correlator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    /// Owner namespace; requests go to `<namespace>.forVault.<op>`
    pub namespace: String,
    /// Deadline for `request` calls that do not pass their own
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,
    /// How often the background sweep removes abandoned pending entries
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            namespace: "app".to_string(),
            default_timeout: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(10),
        }
    }
}

impl CorrelatorConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty()
            || self
                .namespace
                .chars()
                .any(|c| c == '.' || c == '*' || c == '>' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        if self.default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default timeout cannot be 0".into(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "cleanup interval cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Namespace must be a single subject token
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
