//! Replay guard configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Policy knobs for the replay guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayGuardConfig {
    /// Oldest message timestamp still accepted, measured back from now
    #[serde(with = "humantime_serde")]
    pub freshness_window: Duration,
    /// How far in the future a timestamp may claim to be
    #[serde(with = "humantime_serde")]
    pub max_clock_skew: Duration,
    /// Records are kept for `freshness_window * retention_multiplier`
    pub retention_multiplier: u32,
    /// Hard cap on remembered event ids
    pub max_entries: usize,
}

impl Default for ReplayGuardConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(300),
            max_clock_skew: Duration::from_secs(60),
            retention_multiplier: 2,
            max_entries: 10_000,
        }
    }
}

impl ReplayGuardConfig {
    /// How long a seen id is remembered.
    pub fn retention(&self) -> Duration {
        self.freshness_window
            .saturating_mul(self.retention_multiplier)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.freshness_window.is_zero() {
            return Err(ConfigError::InvalidWindow(
                "freshness_window cannot be 0".into(),
            ));
        }
        if self.retention_multiplier == 0 {
            return Err(ConfigError::InvalidWindow(
                "retention_multiplier cannot be 0".into(),
            ));
        }
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidCapacity(
                "max_entries cannot be 0".into(),
            ));
        }
        if chrono::Duration::from_std(self.retention()).is_err()
            || chrono::Duration::from_std(self.max_clock_skew).is_err()
        {
            return Err(ConfigError::InvalidWindow("duration out of range".into()));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
}
