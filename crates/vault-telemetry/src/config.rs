//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Include file and line in log lines
    pub source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vault-channel".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            source_location: false,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VC_SERVICE_NAME`: Service name (default: vault-channel)
    /// - `VC_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `VC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `VC_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("VC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("VC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("VC_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(is_container),

            source_location: lookup("VC_LOG_SOURCE")
                .map(|v| flag(&v))
                .unwrap_or(defaults.source_location),
        }
    }

    /// Configuration for a named component, e.g. `"runtime"`.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, component);
        config
    }
}
