//! # Inbound Ports
//!
//! The ledger-side contract surface: what the private asset contract can do
//! for a submitting client.

use crate::domain::AssetStateError;
use shared_types::{
    Asset, AssetHistoryEntry, AssetPrivateDetails, MspId, OrgIdentity, TransferAgreement,
    TransientMap,
};
use std::collections::BTreeMap;

/// Identity of the client invoking the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerContext {
    /// Decoded X.509 client id.
    pub client_id: String,
    /// Organization of the client.
    pub msp_id: MspId,
    /// Certificate attributes, e.g. `farmer = "true"`.
    pub attributes: BTreeMap<String, String>,
}

impl CallerContext {
    /// Create a new caller context with no attributes.
    pub fn new(client_id: impl Into<String>, msp_id: MspId) -> Self {
        Self {
            client_id: client_id.into(),
            msp_id,
            attributes: BTreeMap::new(),
        }
    }

    /// Caller context for an enrolled identity.
    pub fn from_identity(identity: &OrgIdentity) -> Self {
        Self {
            client_id: identity.client_id(),
            msp_id: identity.msp_id.clone(),
            attributes: identity.attributes(),
        }
    }

    /// Whether the certificate carries `name` with exactly `value`.
    pub fn has_attribute(&self, name: &str, value: &str) -> bool {
        self.attributes.get(name).is_some_and(|v| v == value)
    }
}

/// Private asset contract - inbound port.
///
/// Read operations return `Ok(None)` / an empty vector for absent data.
/// Write operations return `Err` for every precondition failure and leave
/// the ledger untouched in that case.
pub trait AssetContractApi: Send + Sync {
    /// Seed the public base assets.
    fn init_ledger(&self, caller: &CallerContext) -> Result<(), AssetStateError>;

    /// All public assets, ordered by id.
    fn get_all_assets(&self, caller: &CallerContext) -> Result<Vec<Asset>, AssetStateError>;

    /// Create an asset from the `asset_properties` transient entry.
    fn create_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError>;

    /// Public record of one asset.
    fn read_asset(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<Asset>, AssetStateError>;

    /// Whether a public record exists.
    fn asset_exists(&self, caller: &CallerContext, asset_id: &str) -> Result<bool, AssetStateError>;

    /// Private details from the named collection.
    fn read_asset_private_details(
        &self,
        caller: &CallerContext,
        collection: &str,
        asset_id: &str,
    ) -> Result<Option<AssetPrivateDetails>, AssetStateError>;

    /// Record the caller's agreement from the `asset_value` transient entry.
    fn agree_to_transfer(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError>;

    /// Agreement for one asset, if any.
    fn read_transfer_agreement(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<TransferAgreement>, AssetStateError>;

    /// Move ownership using the `asset_owner` transient entry.
    fn transfer_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError>;

    /// Public versions of one asset, oldest first.
    fn get_asset_history(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Vec<AssetHistoryEntry>, AssetStateError>;
}
