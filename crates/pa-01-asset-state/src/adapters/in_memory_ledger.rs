//! In-Memory Ledger Adapter
//!
//! Implements `AssetContractApi` over a simulated channel ledger.
//!
//! Writes are validated against the authoritative world state and appended
//! as blocks. Reads are served from the caller's organization replica, which
//! sees its own commits at once and other organizations' commits only after
//! `gossip_lag` further ledger calls. Private writes reach only the replica of
//! the collection's organization.

use crate::algorithms::{extract_common_name, private_data_hash};
use crate::domain::{
    invariant_agreement_matches, invariant_private_matches_public, AssetLifecycle,
    AssetStateError, Holder,
};
use crate::ports::inbound::{AssetContractApi, CallerContext};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use shared_types::{
    collection_owner, Asset, AssetHistoryEntry, AssetOwnerTransfer, AssetPrivateDetails,
    AssetProperties, AssetValue, ContractOperation, MspId, TransferAgreement, TransientMap,
    UserRole, ATTRIBUTE_TRUE, MEMBER_ASSET_COLLECTION, TRANSIENT_ASSET_OWNER,
    TRANSIENT_ASSET_PROPERTIES, TRANSIENT_ASSET_VALUE,
};
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Base assets written by `InitLedger`: (id, color, size, appraised value).
const BASE_ASSETS: [(&str, &str, u32, u64); 6] = [
    ("asset1", "blue", 5, 300),
    ("asset2", "red", 5, 400),
    ("asset3", "green", 10, 500),
    ("asset4", "yellow", 10, 600),
    ("asset5", "black", 15, 700),
    ("asset6", "white", 15, 800),
];

/// Whether `asset_id` is one of the ids seeded by `InitLedger`.
pub fn is_base_asset(asset_id: &str) -> bool {
    BASE_ASSETS.iter().any(|(id, ..)| *id == asset_id)
}

/// Outcome of reading another organization's private collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForeignCollectionPolicy {
    /// Return no data, as if the record did not exist.
    #[default]
    ReturnEmpty,
    /// Reject the read with an access error.
    Deny,
}

/// Simulated ledger configuration.
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    /// Ledger calls before one organization's commit reaches the others.
    pub gossip_lag: u64,
    /// Behavior of reads against a collection the caller does not own.
    pub foreign_collection_policy: ForeignCollectionPolicy,
}

/// One state change inside a block.
#[derive(Clone, Debug)]
enum Write {
    PutAsset { asset: Asset, note: Option<String> },
    PutAgreement(TransferAgreement),
    DeleteAgreement(String),
    PutPrivate { msp: MspId, details: AssetPrivateDetails },
    DeletePrivate { msp: MspId, asset_id: String },
}

#[derive(Clone, Debug)]
struct Block {
    number: u64,
    tx_id: String,
    committed_by: MspId,
    committed_at: u64,
    submitter: String,
    timestamp: u64,
    writes: Vec<Write>,
}

#[derive(Clone, Debug, Default)]
struct WorldState {
    assets: BTreeMap<String, Asset>,
    agreements: BTreeMap<String, TransferAgreement>,
    private: BTreeMap<MspId, BTreeMap<String, AssetPrivateDetails>>,
}

impl WorldState {
    /// Apply a write. `viewer` restricts private writes to one organization;
    /// `None` applies everything.
    fn apply(&mut self, write: &Write, viewer: Option<&MspId>) {
        let sees = |msp: &MspId| viewer.map_or(true, |v| v == msp);
        match write {
            Write::PutAsset { asset, .. } => {
                self.assets.insert(asset.asset_id.clone(), asset.clone());
            }
            Write::PutAgreement(agreement) => {
                self.agreements
                    .insert(agreement.asset_id.clone(), agreement.clone());
            }
            Write::DeleteAgreement(asset_id) => {
                self.agreements.remove(asset_id);
            }
            Write::PutPrivate { msp, details } if sees(msp) => {
                self.private
                    .entry(msp.clone())
                    .or_default()
                    .insert(details.asset_id.clone(), details.clone());
            }
            Write::DeletePrivate { msp, asset_id } if sees(msp) => {
                if let Some(collection) = self.private.get_mut(msp) {
                    collection.remove(asset_id);
                }
            }
            Write::PutPrivate { .. } | Write::DeletePrivate { .. } => {}
        }
    }

    fn private_details(&self, msp: &MspId, asset_id: &str) -> Option<&AssetPrivateDetails> {
        self.private.get(msp).and_then(|c| c.get(asset_id))
    }
}

/// One organization's peer view.
#[derive(Clone, Debug, Default)]
struct Replica {
    applied: usize,
    state: WorldState,
}

#[derive(Debug, Default)]
struct LedgerInner {
    tick: u64,
    world: WorldState,
    blocks: Vec<Block>,
    replicas: HashMap<MspId, Replica>,
    lifecycles: HashMap<String, AssetLifecycle>,
}

impl LedgerInner {
    /// Bring `msp`'s replica up to date. With `lag == None` every block is
    /// applied; otherwise foreign blocks wait until `lag` ticks have passed.
    fn sync(&mut self, msp: &MspId, lag: Option<u64>) {
        let tick = self.tick;
        let replica = self.replicas.entry(msp.clone()).or_default();
        while let Some(block) = self.blocks.get(replica.applied) {
            let visible = match lag {
                None => true,
                Some(lag) => &block.committed_by == msp || block.committed_at + lag <= tick,
            };
            if !visible {
                break;
            }
            for write in &block.writes {
                replica.state.apply(write, Some(msp));
            }
            replica.applied += 1;
        }
    }

    /// Advance the clock and return the caller's synced replica.
    fn observe(&mut self, msp: &MspId, lag: u64) -> &Replica {
        self.tick += 1;
        self.sync(msp, Some(lag));
        &self.replicas[msp]
    }

    /// Append a block with `writes` and apply it everywhere it is due.
    fn commit(
        &mut self,
        caller: &CallerContext,
        operation: ContractOperation,
        writes: Vec<Write>,
    ) -> String {
        let number = self.blocks.len() as u64 + 1;
        let tx_id = generate_tx_id(number, operation, caller, self.tick);

        for write in &writes {
            self.world.apply(write, None);
        }
        self.blocks.push(Block {
            number,
            tx_id: tx_id.clone(),
            committed_by: caller.msp_id.clone(),
            committed_at: self.tick,
            submitter: caller.client_id.clone(),
            timestamp: unix_seconds(),
            writes,
        });
        self.sync(&caller.msp_id, None);

        info!(
            "[pa-01] Committed {} as block {} by {} (tx {})",
            operation,
            number,
            caller.msp_id,
            &tx_id[..16]
        );
        tx_id
    }

    fn lifecycle(&self, asset_id: &str) -> AssetLifecycle {
        self.lifecycles
            .get(asset_id)
            .cloned()
            .unwrap_or_else(|| AssetLifecycle::new(asset_id))
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generate a transaction id from the block position and the submitter.
fn generate_tx_id(
    number: u64,
    operation: ContractOperation,
    caller: &CallerContext,
    tick: u64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(number.to_le_bytes());
    hasher.update(operation.as_str().as_bytes());
    hasher.update(caller.client_id.as_bytes());
    hasher.update(tick.to_le_bytes());
    hex::encode(hasher.finalize())
}

fn decode_transient<T: DeserializeOwned>(
    transient: &TransientMap,
    key: &str,
) -> Result<T, AssetStateError> {
    let bytes = transient
        .get(key)
        .ok_or_else(|| AssetStateError::MissingTransient(key.to_string()))?;
    serde_json::from_slice(bytes).map_err(|e| AssetStateError::MalformedTransient {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AssetStateError> {
    if value.is_empty() {
        return Err(AssetStateError::InvalidField {
            field: field.to_string(),
            reason: "must be a non-empty string".to_string(),
        });
    }
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), AssetStateError> {
    if value == 0 {
        return Err(AssetStateError::InvalidField {
            field: field.to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(())
}

/// Common name of the caller, rejected when it cannot be derived.
fn caller_name(caller: &CallerContext) -> Result<String, AssetStateError> {
    let name = extract_common_name(&caller.client_id);
    if name.is_empty() {
        return Err(AssetStateError::InvalidField {
            field: "clientID".to_string(),
            reason: "does not carry an x509 common name".to_string(),
        });
    }
    Ok(name)
}

/// Only callers enrolled as Farmer may create assets.
fn require_farmer(caller: &CallerContext) -> Result<(), AssetStateError> {
    if caller.has_attribute(UserRole::Retailer.attribute(), ATTRIBUTE_TRUE) {
        return Err(AssetStateError::RetailerCannotCreate);
    }
    if !caller.has_attribute(UserRole::Farmer.attribute(), ATTRIBUTE_TRUE) {
        return Err(AssetStateError::NotFarmer);
    }
    Ok(())
}

/// Simulated channel ledger running the private asset contract.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    config: LedgerConfig,
    inner: Mutex<LedgerInner>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    /// Ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of committed blocks.
    pub fn height(&self) -> u64 {
        self.inner.lock().blocks.len() as u64
    }

    /// Ledger-side lifecycle of an asset, if it was ever created.
    pub fn lifecycle(&self, asset_id: &str) -> Option<AssetLifecycle> {
        self.inner.lock().lifecycles.get(asset_id).cloned()
    }
}

impl AssetContractApi for InMemoryLedger {
    fn init_ledger(&self, caller: &CallerContext) -> Result<(), AssetStateError> {
        let owner = caller_name(caller)?;
        let holder = Holder::new(caller.msp_id.clone(), owner.clone());

        let mut inner = self.inner.lock();
        inner.tick += 1;

        let writes = BASE_ASSETS
            .iter()
            .map(|(id, color, size, value)| Write::PutAsset {
                asset: Asset {
                    asset_id: id.to_string(),
                    color: color.to_string(),
                    size: *size,
                    owner: owner.clone(),
                    appraised_value: *value,
                },
                note: None,
            })
            .collect();
        for (id, ..) in BASE_ASSETS {
            inner
                .lifecycles
                .insert(id.to_string(), AssetLifecycle::committed(id, holder.clone()));
        }
        inner.commit(caller, ContractOperation::InitLedger, writes);
        Ok(())
    }

    fn get_all_assets(&self, caller: &CallerContext) -> Result<Vec<Asset>, AssetStateError> {
        let mut inner = self.inner.lock();
        let replica = inner.observe(&caller.msp_id, self.config.gossip_lag);
        Ok(replica.state.assets.values().cloned().collect())
    }

    fn create_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        require_farmer(caller)?;
        let props: AssetProperties = decode_transient(transient, TRANSIENT_ASSET_PROPERTIES)?;
        require_non_empty("assetID", &props.asset_id)?;
        require_non_empty("color", &props.color)?;
        require_positive("size", u64::from(props.size))?;
        require_positive("appraisedValue", props.appraised_value)?;
        let owner = caller_name(caller)?;

        let mut inner = self.inner.lock();
        inner.tick += 1;

        if inner.world.assets.contains_key(&props.asset_id) {
            return Err(AssetStateError::AssetAlreadyExists(props.asset_id));
        }

        let mut lifecycle = inner.lifecycle(&props.asset_id);
        lifecycle.submit_create(Holder::new(caller.msp_id.clone(), owner.clone()))?;

        let asset = props.public_projection(owner);
        let details = props.private_details();
        invariant_private_matches_public(&asset, &details)?;

        debug!(
            "[pa-01] Creating {} in {}",
            asset.asset_id,
            caller.msp_id.private_collection()
        );
        let writes = vec![
            Write::PutAsset { asset, note: None },
            Write::PutPrivate {
                msp: caller.msp_id.clone(),
                details,
            },
        ];
        inner.commit(caller, ContractOperation::CreatePrivateAsset, writes);

        lifecycle.confirm_commit()?;
        inner.lifecycles.insert(props.asset_id.clone(), lifecycle);
        Ok(())
    }

    fn read_asset(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<Asset>, AssetStateError> {
        let mut inner = self.inner.lock();
        let replica = inner.observe(&caller.msp_id, self.config.gossip_lag);
        Ok(replica.state.assets.get(asset_id).cloned())
    }

    fn asset_exists(&self, caller: &CallerContext, asset_id: &str) -> Result<bool, AssetStateError> {
        let mut inner = self.inner.lock();
        let replica = inner.observe(&caller.msp_id, self.config.gossip_lag);
        Ok(replica.state.assets.contains_key(asset_id))
    }

    fn read_asset_private_details(
        &self,
        caller: &CallerContext,
        collection: &str,
        asset_id: &str,
    ) -> Result<Option<AssetPrivateDetails>, AssetStateError> {
        let owner = match collection_owner(collection) {
            Some(owner) => owner,
            // The member collection never holds private details
            None if collection == MEMBER_ASSET_COLLECTION => return Ok(None),
            None => return Err(AssetStateError::UnknownCollection(collection.to_string())),
        };

        if owner != caller.msp_id {
            match self.config.foreign_collection_policy {
                ForeignCollectionPolicy::ReturnEmpty => {
                    debug!("[pa-01] {} read foreign collection {}", caller.msp_id, collection);
                    return Ok(None);
                }
                ForeignCollectionPolicy::Deny => {
                    return Err(AssetStateError::CollectionAccessDenied {
                        msp: caller.msp_id.to_string(),
                        collection: collection.to_string(),
                    });
                }
            }
        }

        let mut inner = self.inner.lock();
        let replica = inner.observe(&caller.msp_id, self.config.gossip_lag);
        Ok(replica.state.private_details(&owner, asset_id).cloned())
    }

    fn agree_to_transfer(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        let value: AssetValue = decode_transient(transient, TRANSIENT_ASSET_VALUE)?;
        require_non_empty("assetID", &value.asset_id)?;
        let buyer = caller_name(caller)?;

        let mut inner = self.inner.lock();
        inner.tick += 1;

        if !inner.world.assets.contains_key(&value.asset_id) {
            return Err(AssetStateError::AssetNotFound(value.asset_id));
        }

        let mut lifecycle = inner.lifecycle(&value.asset_id);
        lifecycle.record_agreement(Holder::new(caller.msp_id.clone(), buyer.clone()))?;

        debug!(
            "[pa-01] {} agrees to buy {}",
            caller.msp_id, value.asset_id
        );
        let writes = vec![
            Write::PutPrivate {
                msp: caller.msp_id.clone(),
                details: value.clone(),
            },
            Write::PutAgreement(TransferAgreement {
                asset_id: value.asset_id.clone(),
                buyer_id: buyer,
            }),
        ];
        inner.commit(caller, ContractOperation::AgreeToTransfer, writes);
        inner.lifecycles.insert(value.asset_id.clone(), lifecycle);
        Ok(())
    }

    fn read_transfer_agreement(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<TransferAgreement>, AssetStateError> {
        let mut inner = self.inner.lock();
        let replica = inner.observe(&caller.msp_id, self.config.gossip_lag);
        Ok(replica.state.agreements.get(asset_id).cloned())
    }

    fn transfer_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        let request: AssetOwnerTransfer = decode_transient(transient, TRANSIENT_ASSET_OWNER)?;
        require_non_empty("assetID", &request.asset_id)?;
        require_non_empty("buyerMSP", &request.buyer_msp)?;
        let client = caller_name(caller)?;
        let buyer_msp = MspId::new(request.buyer_msp.as_str());
        let asset_id = request.asset_id;

        let mut inner = self.inner.lock();
        inner.tick += 1;

        let asset = inner
            .world
            .assets
            .get(&asset_id)
            .cloned()
            .ok_or_else(|| AssetStateError::AssetNotFound(asset_id.clone()))?;
        let mut lifecycle = inner.lifecycle(&asset_id);

        if asset.owner != client || lifecycle.owner_msp() != Some(&caller.msp_id) {
            return Err(AssetStateError::NotOwner {
                asset_id,
                client,
            });
        }
        if buyer_msp == caller.msp_id {
            return Err(AssetStateError::SelfTransfer {
                asset_id,
                msp: buyer_msp.to_string(),
            });
        }

        let owner_hash = inner
            .world
            .private_details(&caller.msp_id, &asset_id)
            .map(private_data_hash)
            .transpose()?;
        let buyer_hash = inner
            .world
            .private_details(&buyer_msp, &asset_id)
            .map(private_data_hash)
            .transpose()?;
        invariant_agreement_matches(
            &asset_id,
            owner_hash.as_ref(),
            &caller.msp_id.private_collection(),
            buyer_hash.as_ref(),
            &buyer_msp.private_collection(),
        )?;

        let agreement = inner.world.agreements.get(&asset_id).cloned().ok_or_else(|| {
            AssetStateError::AgreementMissing {
                asset_id: asset_id.clone(),
                collection: buyer_msp.private_collection(),
            }
        })?;
        lifecycle.complete_transfer(&buyer_msp)?;

        info!(
            "[pa-01] Transferring {} from {} to {}",
            asset_id, caller.msp_id, buyer_msp
        );
        let note = format!("{client} is transferring {asset_id} to {}", agreement.buyer_id);
        let writes = vec![
            Write::PutAsset {
                asset: Asset {
                    owner: agreement.buyer_id,
                    ..asset
                },
                note: Some(note),
            },
            Write::DeletePrivate {
                msp: caller.msp_id.clone(),
                asset_id: asset_id.clone(),
            },
            Write::DeleteAgreement(asset_id.clone()),
        ];
        inner.commit(caller, ContractOperation::TransferPrivateAsset, writes);
        inner.lifecycles.insert(asset_id, lifecycle);
        Ok(())
    }

    fn get_asset_history(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Vec<AssetHistoryEntry>, AssetStateError> {
        let mut inner = self.inner.lock();
        let applied = inner.observe(&caller.msp_id, self.config.gossip_lag).applied;

        let history = inner.blocks[..applied]
            .iter()
            .flat_map(|block| {
                block.writes.iter().filter_map(move |write| match write {
                    Write::PutAsset { asset, note } if asset.asset_id == asset_id => {
                        Some(AssetHistoryEntry {
                            tx_id: block.tx_id.clone(),
                            block_number: block.number,
                            is_delete: false,
                            value: Some(asset.clone()),
                            timestamp: block.timestamp,
                            creator: block.submitter.clone(),
                            transferred_to: note.clone(),
                        })
                    }
                    _ => None,
                })
            })
            .collect();
        Ok(history)
    }
}
