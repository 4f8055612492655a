//! # Ledger Records
//!
//! JSON shapes read from and written to the contract.
//!
//! ## Records
//!
//! - **Public**: `Asset`, `AssetHistoryEntry`, `TransferAgreement`
//! - **Private**: `AssetPrivateDetails` (lives in one organization's collection)
//! - **Transient**: `AssetProperties`, `AssetValue`, `AssetOwnerTransfer`

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The secret value kept in an organization's private collection.
///
/// Zeroized on drop and redacted in `Debug` output, so it never ends up in
/// logs by accident.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct AssetSecret(u64);

impl AssetSecret {
    /// Wrap a secret value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Expose the raw value (use immediately and let go).
    pub fn expose(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for AssetSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AssetSecret(***)")
    }
}

/// Public asset record, readable by every channel member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique, immutable identifier.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Descriptive color.
    pub color: String,
    /// Descriptive size.
    pub size: u32,
    /// Identity string of the current owner.
    pub owner: String,
    /// Appraised value.
    #[serde(rename = "appraisedValue")]
    pub appraised_value: u64,
}

impl Asset {
    /// An asset is "owned by" a user when its owner field contains the
    /// user identifier.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.owner.contains(user_id)
    }
}

/// Organization-scoped private record paired with a public `Asset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPrivateDetails {
    /// Must equal the paired `Asset::asset_id`.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Secret known only inside the owning organization.
    pub secret: AssetSecret,
}

/// Transient payload of `AgreeToTransfer`: the buyer's proof of secret
/// knowledge. Stored verbatim in the buyer's private collection.
pub type AssetValue = AssetPrivateDetails;

/// Transient payload of `CreatePrivateAsset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetProperties {
    /// Identifier of the new asset.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Descriptive color.
    pub color: String,
    /// Descriptive size.
    pub size: u32,
    /// Appraised value.
    #[serde(rename = "appraisedValue")]
    pub appraised_value: u64,
    /// Secret stored in the creator's private collection only.
    pub secret: AssetSecret,
}

impl AssetProperties {
    /// Public projection of the properties under the given owner.
    ///
    /// The secret is dropped here; it never reaches the public record.
    pub fn public_projection(&self, owner: impl Into<String>) -> Asset {
        Asset {
            asset_id: self.asset_id.clone(),
            color: self.color.clone(),
            size: self.size,
            owner: owner.into(),
            appraised_value: self.appraised_value,
        }
    }

    /// Private projection stored in the creator's collection.
    pub fn private_details(&self) -> AssetPrivateDetails {
        AssetPrivateDetails {
            asset_id: self.asset_id.clone(),
            secret: self.secret.clone(),
        }
    }
}

/// Transient payload of `TransferPrivateAsset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOwnerTransfer {
    /// Asset being transferred.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// MSP id of the buying organization.
    #[serde(rename = "buyerMSP")]
    pub buyer_msp: String,
}

/// Record created by the buyer's `AgreeToTransfer`, readable by all members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAgreement {
    /// Asset the agreement refers to.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Identity of the agreeing buyer.
    #[serde(rename = "buyerID")]
    pub buyer_id: String,
}

/// One historical version of a public asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHistoryEntry {
    /// Transaction that wrote this version.
    #[serde(rename = "txId")]
    pub tx_id: String,
    /// Block in which the transaction committed.
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    /// Whether this version is a deletion marker.
    #[serde(rename = "isDelete")]
    pub is_delete: bool,
    /// Asset value as written (absent for deletions).
    #[serde(default)]
    pub value: Option<Asset>,
    /// Commit time, seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
    /// Client id (certificate DN) of the submitter.
    #[serde(default)]
    pub creator: String,
    /// Transfer note, e.g. `Farmer7 is transferring asset7 to Retailer7`.
    #[serde(rename = "transferredTo", default, skip_serializing_if = "Option::is_none")]
    pub transferred_to: Option<String>,
}
