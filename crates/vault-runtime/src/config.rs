//! # Channel Configuration
//!
//! Runtime parameters for one vault channel, overridable from the
//! environment.

use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use vc_02_replay_guard::ReplayGuardConfig;
use vc_03_request_correlator::CorrelatorConfig;

/// Complete channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Owner namespace used in bus subjects.
    pub namespace: String,
    /// Deadline for a request/response round trip.
    pub request_timeout: Duration,
    /// Lifetime of a freshly negotiated session.
    pub session_ttl: Duration,
    /// Replay guard policy, shared by both ends of the loopback.
    pub replay: ReplayGuardConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            namespace: "app".to_string(),
            request_timeout: Duration::from_secs(30),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            replay: ReplayGuardConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid correlator configuration: {0}")]
    Correlator(#[from] vc_03_request_correlator::ConfigError),

    #[error("Invalid replay guard configuration: {0}")]
    Replay(#[from] vc_02_replay_guard::ConfigError),

    #[error("Session TTL cannot be 0")]
    ZeroSessionTtl,
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

impl ChannelConfig {
    /// Load configuration, applying environment overrides.
    ///
    /// # Environment Variables
    ///
    /// - `VC_NAMESPACE`: Subject namespace (default: app)
    /// - `VC_REQUEST_TIMEOUT_MS`: Request deadline (default: 30000)
    /// - `VC_SESSION_TTL_SECS`: Session lifetime (default: 86400)
    /// - `VC_FRESHNESS_WINDOW_SECS`: Replay freshness window (default: 300)
    /// - `VC_MAX_CLOCK_SKEW_SECS`: Accepted future skew (default: 60)
    /// - `VC_REPLAY_MAX_ENTRIES`: Replay cache capacity (default: 10000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(namespace) = lookup("VC_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "VC_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "VC_SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "VC_FRESHNESS_WINDOW_SECS") {
            config.replay.freshness_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "VC_MAX_CLOCK_SKEW_SECS") {
            config.replay.max_clock_skew = Duration::from_secs(secs);
        }
        if let Some(entries) = parse_var::<usize>(&lookup, "VC_REPLAY_MAX_ENTRIES") {
            config.replay.max_entries = entries;
        }

        config
    }

    pub fn correlator_config(&self) -> CorrelatorConfig {
        CorrelatorConfig::new(self.namespace.clone()).with_default_timeout(self.request_timeout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.correlator_config().validate()?;
        self.replay.validate()?;
        if self.session_ttl.is_zero() {
            return Err(ConfigError::ZeroSessionTtl);
        }
        Ok(())
    }
}
