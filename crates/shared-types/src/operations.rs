//! # Contract Operations
//!
//! Named operations of the private asset contract and the invocation
//! envelope handed to the Transaction Gateway.
//!
//! | Operation | Kind | Transient key |
//! |---|---|---|
//! | `InitLedger` | submit | - |
//! | `GetAllAssets` | evaluate | - |
//! | `CreatePrivateAsset` | submit | `asset_properties` |
//! | `ReadAsset` | evaluate | - |
//! | `AssetExists` | evaluate | - |
//! | `ReadAssetPrivateDetails` | evaluate | - |
//! | `AgreeToTransfer` | submit | `asset_value` |
//! | `ReadTransferAgreement` | evaluate | - |
//! | `TransferPrivateAsset` | submit | `asset_owner` |
//! | `GetAssetHistory` | evaluate | - |

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Transient key carrying `AssetProperties` for `CreatePrivateAsset`.
pub const TRANSIENT_ASSET_PROPERTIES: &str = "asset_properties";

/// Transient key carrying `AssetValue` for `AgreeToTransfer`.
pub const TRANSIENT_ASSET_VALUE: &str = "asset_value";

/// Transient key carrying `AssetOwnerTransfer` for `TransferPrivateAsset`.
pub const TRANSIENT_ASSET_OWNER: &str = "asset_owner";

/// Private, non-ledgered data attached to a submission.
pub type TransientMap = BTreeMap<String, Vec<u8>>;

/// Operations exposed by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractOperation {
    InitLedger,
    GetAllAssets,
    CreatePrivateAsset,
    ReadAsset,
    AssetExists,
    ReadAssetPrivateDetails,
    AgreeToTransfer,
    ReadTransferAgreement,
    TransferPrivateAsset,
    GetAssetHistory,
}

impl ContractOperation {
    /// Every operation, in table order.
    pub const ALL: [ContractOperation; 10] = [
        Self::InitLedger,
        Self::GetAllAssets,
        Self::CreatePrivateAsset,
        Self::ReadAsset,
        Self::AssetExists,
        Self::ReadAssetPrivateDetails,
        Self::AgreeToTransfer,
        Self::ReadTransferAgreement,
        Self::TransferPrivateAsset,
        Self::GetAssetHistory,
    ];

    /// Contract-side function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitLedger => "InitLedger",
            Self::GetAllAssets => "GetAllAssets",
            Self::CreatePrivateAsset => "CreatePrivateAsset",
            Self::ReadAsset => "ReadAsset",
            Self::AssetExists => "AssetExists",
            Self::ReadAssetPrivateDetails => "ReadAssetPrivateDetails",
            Self::AgreeToTransfer => "AgreeToTransfer",
            Self::ReadTransferAgreement => "ReadTransferAgreement",
            Self::TransferPrivateAsset => "TransferPrivateAsset",
            Self::GetAssetHistory => "GetAssetHistory",
        }
    }

    /// Whether the operation writes to the ledger (must be submitted).
    pub fn is_submit(&self) -> bool {
        matches!(
            self,
            Self::InitLedger
                | Self::CreatePrivateAsset
                | Self::AgreeToTransfer
                | Self::TransferPrivateAsset
        )
    }

    /// Transient key the operation reads its private payload from.
    pub fn transient_key(&self) -> Option<&'static str> {
        match self {
            Self::CreatePrivateAsset => Some(TRANSIENT_ASSET_PROPERTIES),
            Self::AgreeToTransfer => Some(TRANSIENT_ASSET_VALUE),
            Self::TransferPrivateAsset => Some(TRANSIENT_ASSET_OWNER),
            _ => None,
        }
    }
}

impl fmt::Display for ContractOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown contract operation: {s}"))
    }
}

/// One call against the contract: operation, positional arguments and an
/// optional transient map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Operation to run.
    pub operation: ContractOperation,
    /// Positional string arguments.
    pub args: Vec<String>,
    /// Transient payload (never written to the ledger).
    pub transient: TransientMap,
}

impl Invocation {
    /// Invocation without arguments or transient data.
    pub fn new(operation: ContractOperation) -> Self {
        Self {
            operation,
            args: Vec::new(),
            transient: TransientMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Attach a JSON-encoded transient payload under `key`.
    pub fn transient<T: Serialize>(mut self, key: &str, payload: &T) -> serde_json::Result<Self> {
        self.transient
            .insert(key.to_string(), serde_json::to_vec(payload)?);
        Ok(self)
    }
}
