//! # Transfer Runtime
//!
//! Entry point: one confidential asset transfer between Org1 and Org2.
//!
//! ## Environment
//!
//! - `PA_RUN_ID`, `PA_TIMEOUT_SECS`, `PA_GOSSIP_LAG`, `PA_READ_ATTEMPTS`,
//!   `PA_READ_BACKOFF_MS`: run settings (see `--help`)
//! - `PA_LOG_LEVEL` / `RUST_LOG`, `PA_JSON_LOGS`, `PA_SERVICE_NAME`: logging

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pa_telemetry::{init_logging, TelemetryConfig};
use tracing::info;
use transfer_runtime::{describe_failure, RuntimeConfig, TransferRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::parse();

    // Initialize logging
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("failed to install logging")?;

    let runtime = TransferRuntime::new(config);
    let report = runtime
        .run()
        .await
        .map_err(|e| anyhow!(describe_failure(&e)))?;

    info!(
        run_id = %report.run_id,
        asset_id = %report.asset_id,
        owner = %report.transferred.owner,
        negative_path = report.negative_path.label(),
        history_versions = report.history.len(),
        "Transfer complete"
    );
    println!(
        "{} transferred from {} to {} ({} history versions)",
        report.asset_id,
        report.seller,
        report.buyer,
        report.history.len()
    );
    Ok(())
}
