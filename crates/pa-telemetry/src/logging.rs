//! Structured logging setup.
//!
//! Every line carries the fields the transfer protocol records:
//! - `step`: protocol step (`createPrivateAsset`, ...)
//! - `org`: acting organization MSP id
//! - `asset_id`: asset under transfer
//! - `outcome`: `ok`, `rejected`, `degraded` or `failed`

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::InvalidFilter {
        directive: config.log_level.clone(),
        reason: e.to_string(),
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.json_logs {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log a protocol step event with standard fields.
///
/// ```rust,ignore
/// log_step!(info, Step::AgreeToTransfer, org = %msp, asset_id = %id, "Agreement committed");
/// ```
#[macro_export]
macro_rules! log_step {
    ($level:ident, $step:expr, $($rest:tt)+) => {
        tracing::$level!(step = %$step, $($rest)+)
    };
}
