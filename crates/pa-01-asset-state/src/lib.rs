//! # PA-01 Asset State Machine
//!
//! Lifecycle of a private asset whose public shell is visible to every
//! channel member while its secret lives in one organization's private
//! collection.
//!
//! **Subsystem ID:** 01  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//! NonExistent ──create──→ PrivatePending ──commit──→ PrivateOwned(seller)
//!                                                        │
//!                                                  AgreeToTransfer (buyer)
//!                                                        ↓
//!                    PrivateOwned(buyer) ←──transfer── TransferAgreed
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Rule |
//! |-----------|------|
//! | private-matches-public | private `assetID` equals the public `assetID` |
//! | agreement-matches | transfer needs a buyer copy whose hash equals the owner's |
//! | no-agreement-no-transfer | without an agreement every transfer is rejected, owner unchanged |
//! | transfer-effect | after transfer the buyer owns the asset and holds the secret |
//!
//! ## Module Structure
//!
//! ```text
//! pa-01-asset-state/
//! ├── domain/          # AssetPhase, AssetLifecycle, invariants, errors
//! ├── algorithms/      # private data hashing, client identity parsing
//! ├── ports/           # AssetContractApi, TransactionGateway, GatewayConnector
//! └── adapters/        # in-memory ledger, contract router, local gateway
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    is_base_asset, ContractRouter, FaultPlan, ForeignCollectionPolicy, InMemoryLedger, LedgerConfig,
    LocalConnector, LocalGateway,
};
pub use algorithms::{extract_common_name, hash_hex, private_data_hash};
pub use domain::{
    invariant_agreement_matches, invariant_private_matches_public, invariant_transfer_effect,
    AssetLifecycle, AssetPhase, AssetStateError, Holder, PrivateDataHash,
};
pub use ports::{AssetContractApi, CallerContext, GatewayConnector, TransactionGateway};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
