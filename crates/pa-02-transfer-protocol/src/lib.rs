//! # PA-02 Transfer Protocol Orchestrator
//!
//! Runs the confidential two-organization transfer end to end: seeds the
//! ledger, creates a private asset as the seller, proves the contract
//! refuses a transfer without agreement, records the buyer's agreement,
//! transfers, and reads the history. Every result is verified before the
//! next step.
//!
//! **Subsystem ID:** 02
//! **Architecture:** step sequencer over per-organization gateway sessions
//!
//! ## Protocol
//!
//! | # | Step | Acting org | On failure |
//! |---|------|------------|------------|
//! | 1 | initializeLedger | seller | fatal |
//! | 2 | listAllAssets | seller | fatal |
//! | 3 | createPrivateAsset | seller | fatal |
//! | 4 | attemptUnauthorizedTransfer | seller | rejection expected; success fatal |
//! | 5 | agreeToTransfer | buyer | fatal |
//! | 6 | readTransferAgreement | seller | fatal |
//! | 7 | transferPrivateAsset | seller | fatal |
//! | 8 | getAssetHistory | seller | fatal |
//!
//! ## Module Structure
//!
//! ```text
//! pa-02-transfer-protocol/
//! ├── config.rs         # ProtocolConfig, RetryPolicy, check policies
//! ├── domain/           # Step, RunReport, outcomes
//! ├── error.rs          # ProtocolError
//! ├── orchestrator.rs   # TransferOrchestrator
//! ├── retry.rs          # bounded retry for cross-org reads
//! ├── session.rs        # scoped per-org sessions
//! └── verification.rs   # payload decoding and field checks
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod session;
pub mod verification;

// Re-exports
pub use config::{
    AbsentCollectionPolicy, AssetTemplate, ConfigError, ProtocolConfig, RetryPolicy,
    SellerCopyCheck,
};
pub use domain::{ForeignReadOutcome, NegativePathOutcome, RunReport, SellerCopyStatus, Step};
pub use error::{ProtocolError, Result};
pub use orchestrator::{read_policy, Session, TransferOrchestrator, TransferOutcome};
pub use retry::read_with_retry;
pub use session::{OrgSession, Role};
pub use verification::{ExpectedAsset, VerificationError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
