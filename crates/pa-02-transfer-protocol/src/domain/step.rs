//! # Protocol Steps
//!
//! | # | Step | Acting org | Failure |
//! |---|------|------------|---------|
//! | 1 | `initializeLedger` | seller | fatal |
//! | 2 | `listAllAssets` | seller | fatal |
//! | 3 | `createPrivateAsset` | seller | fatal |
//! | 4 | `attemptUnauthorizedTransfer` | seller | expected |
//! | 5 | `agreeToTransfer` | buyer | fatal |
//! | 6 | `readTransferAgreement` | seller | fatal |
//! | 7 | `transferPrivateAsset` | seller | fatal |
//! | 8 | `getAssetHistory` | seller | fatal |
//!
//! `connect` covers opening the per-organization sessions before step 1.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A step of the transfer protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    /// Open organization sessions.
    Connect,
    /// Seed the ledger.
    InitializeLedger,
    /// Read every public asset.
    ListAllAssets,
    /// Create the private asset as the seller.
    CreatePrivateAsset,
    /// Transfer before any agreement; must be rejected.
    AttemptUnauthorizedTransfer,
    /// Buyer proves knowledge of the secret.
    AgreeToTransfer,
    /// Read the buyer's agreement.
    ReadTransferAgreement,
    /// Transfer after the agreement.
    TransferPrivateAsset,
    /// Read the asset's history.
    GetAssetHistory,
}

impl Step {
    /// Protocol steps in run order.
    pub const SEQUENCE: [Step; 8] = [
        Step::InitializeLedger,
        Step::ListAllAssets,
        Step::CreatePrivateAsset,
        Step::AttemptUnauthorizedTransfer,
        Step::AgreeToTransfer,
        Step::ReadTransferAgreement,
        Step::TransferPrivateAsset,
        Step::GetAssetHistory,
    ];

    /// Step name as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Connect => "connect",
            Step::InitializeLedger => "initializeLedger",
            Step::ListAllAssets => "listAllAssets",
            Step::CreatePrivateAsset => "createPrivateAsset",
            Step::AttemptUnauthorizedTransfer => "attemptUnauthorizedTransfer",
            Step::AgreeToTransfer => "agreeToTransfer",
            Step::ReadTransferAgreement => "readTransferAgreement",
            Step::TransferPrivateAsset => "transferPrivateAsset",
            Step::GetAssetHistory => "getAssetHistory",
        }
    }

    /// 1-based position in the run, `None` for `Connect`.
    pub fn number(&self) -> Option<usize> {
        Self::SEQUENCE.iter().position(|s| s == self).map(|i| i + 1)
    }

    /// Whether the step is the deliberate negative path.
    pub fn expects_failure(&self) -> bool {
        matches!(self, Step::AttemptUnauthorizedTransfer)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
