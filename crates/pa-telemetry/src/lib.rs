//! # PA Telemetry
//!
//! Logging bootstrap for the private asset transfer workspace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pa_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PA_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `PA_JSON_LOGS` | `false` | JSON formatted output |
//! | `PA_SERVICE_NAME` | `private-asset-transfer` | Service name attached to logs |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter {directive}: {reason}")]
    InvalidFilter {
        /// Directive as configured
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}
