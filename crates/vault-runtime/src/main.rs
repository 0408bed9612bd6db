//! Vault channel demo binary.
//!
//! Runs a loopback channel, pings the vault once and exits. Set
//! `VC_KEEP_RUNNING=1` to keep it up until Ctrl+C.

use anyhow::{Context, Result};
use shared_types::SystemClock;
use tracing::info;
use vault_runtime::{ChannelConfig, ChannelRuntime};
use vault_telemetry::{init_logging, log_event, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::for_component("runtime"))
        .context("Failed to initialize logging")?;

    let config = ChannelConfig::from_env();
    info!(
        namespace = %config.namespace,
        request_timeout_ms = config.request_timeout.as_millis(),
        "Starting vault channel"
    );

    let runtime = ChannelRuntime::start(config, SystemClock::shared())
        .await
        .context("Failed to start channel")?;

    let reply = runtime.ping().await.context("Ping failed")?;
    log_event!(info, "runtime", "Vault answered ping", reply = %reply);

    let stats = runtime.correlator().stats();
    info!(
        completed = stats.completed,
        timed_out = stats.timed_out,
        late_responses = stats.late_responses,
        failed = stats.failed,
        "Request statistics"
    );

    let keep_running = std::env::var("VC_KEEP_RUNNING")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if keep_running {
        info!("Channel is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;
    }

    runtime.shutdown().context("Failed to clear sessions")?;
    Ok(())
}
