//! # Private Asset Transfer Runtime
//!
//! Wires one transfer run: configuration from flags and environment, the
//! simulated ledger, the local gateway connector and the transfer
//! orchestrator.
//!
//! ## Startup Sequence
//!
//! 1. Parse `RuntimeConfig` (flags, `PA_*` environment overrides)
//! 2. Install logging (`pa-telemetry`)
//! 3. Resolve the run id (generated when not supplied)
//! 4. Build the ledger and connector, run the orchestrator
//! 5. Exit 0 on success, 1 naming the failing step otherwise

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pa_01_asset_state::{ForeignCollectionPolicy, InMemoryLedger, LedgerConfig, LocalConnector};
use pa_02_transfer_protocol::config::{DEFAULT_READ_ATTEMPTS, DEFAULT_READ_BACKOFF};
use pa_02_transfer_protocol::{
    AbsentCollectionPolicy, ProtocolConfig, ProtocolError, RetryPolicy, RunReport,
    SellerCopyCheck, TransferOrchestrator,
};
use tracing::info;
use uuid::Uuid;

/// Length of a generated run id.
const GENERATED_RUN_ID_LEN: usize = 8;

const DEFAULT_READ_BACKOFF_MS: u64 = DEFAULT_READ_BACKOFF.as_millis() as u64;

/// Runtime configuration.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "transfer-runtime")]
#[command(about = "Confidential two-organization asset transfer over a simulated ledger")]
pub struct RuntimeConfig {
    /// Run id injected into the asset and user ids (generated when absent)
    #[arg(long, env = "PA_RUN_ID")]
    pub run_id: Option<String>,

    /// Deadline for the whole run, in seconds
    #[arg(long, env = "PA_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Ticks before a commit reaches the other organization's peer
    #[arg(long, env = "PA_GOSSIP_LAG", default_value_t = 0)]
    pub gossip_lag: u64,

    /// Attempts per cross-organization read
    #[arg(long, env = "PA_READ_ATTEMPTS", default_value_t = DEFAULT_READ_ATTEMPTS)]
    pub read_attempts: u32,

    /// Pause between read attempts, in milliseconds
    #[arg(long, env = "PA_READ_BACKOFF_MS", default_value_t = DEFAULT_READ_BACKOFF_MS)]
    pub read_backoff_ms: u64,

    /// Make the contract reject reads of another organization's collection
    #[arg(long)]
    pub deny_foreign_reads: bool,

    /// Treat only an empty result as an absent foreign collection
    #[arg(long)]
    pub strict_absent: bool,

    /// Do not check the seller's collection after the transfer
    #[arg(long)]
    pub skip_seller_copy_check: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            timeout_secs: 30,
            gossip_lag: 0,
            read_attempts: DEFAULT_READ_ATTEMPTS,
            read_backoff_ms: DEFAULT_READ_BACKOFF_MS,
            deny_foreign_reads: false,
            strict_absent: false,
            skip_seller_copy_check: false,
        }
    }
}

impl RuntimeConfig {
    /// Simulated ledger settings.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            gossip_lag: self.gossip_lag,
            foreign_collection_policy: if self.deny_foreign_reads {
                ForeignCollectionPolicy::Deny
            } else {
                ForeignCollectionPolicy::ReturnEmpty
            },
        }
    }

    /// Orchestrator settings for `run_id`.
    pub fn protocol_config(&self, run_id: &str) -> ProtocolConfig {
        let mut config = ProtocolConfig::for_run(run_id);
        config.read_retry = RetryPolicy {
            max_attempts: self.read_attempts,
            backoff: Duration::from_millis(self.read_backoff_ms),
        };
        config.run_timeout = Duration::from_secs(self.timeout_secs);
        if self.strict_absent {
            config.absent_collection = AbsentCollectionPolicy::EmptyOnly;
        }
        if self.skip_seller_copy_check {
            config.seller_copy_check = SellerCopyCheck::Skip;
        }
        config
    }
}

/// Fresh run id: the first characters of a random UUID.
pub fn generate_run_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_RUN_ID_LEN)
        .collect()
}

/// One-line failure summary naming the step and, for mismatches, the field.
pub fn describe_failure(error: &ProtocolError) -> String {
    let step = error.step().map(|s| s.as_str()).unwrap_or("run");
    match error.field() {
        Some(field) => format!("transfer failed at {step} (field {field}): {error}"),
        None => format!("transfer failed at {step}: {error}"),
    }
}

/// The runtime: a ledger and the configuration to run against it.
pub struct TransferRuntime {
    config: RuntimeConfig,
    ledger: Arc<InMemoryLedger>,
}

impl TransferRuntime {
    /// Create a runtime with a fresh simulated ledger.
    pub fn new(config: RuntimeConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(config.ledger_config()));
        Self { config, ledger }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Simulated ledger the runs go against.
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Run the transfer once.
    pub async fn run(&self) -> Result<RunReport, ProtocolError> {
        let run_id = self.config.run_id.clone().unwrap_or_else(generate_run_id);
        info!(
            run_id = %run_id,
            gossip_lag = self.config.gossip_lag,
            timeout_secs = self.config.timeout_secs,
            "Starting transfer runtime"
        );

        let connector = LocalConnector::new(self.ledger.clone());
        let orchestrator =
            TransferOrchestrator::new(connector, self.config.protocol_config(&run_id))?;
        orchestrator.run().await
    }
}
