//! # Domain Entities
//!
//! `AssetLifecycle` tracks one asset through create, agree and transfer.
//! The in-memory ledger keeps one per asset; the transfer orchestrator keeps
//! its own copy to enforce step ordering on the client side.

use super::errors::AssetStateError;
use super::value_objects::{AssetPhase, Holder};
use serde::{Deserialize, Serialize};
use shared_types::MspId;

/// Lifecycle of a single private asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLifecycle {
    /// Asset identifier.
    pub asset_id: String,
    /// Current phase.
    pub phase: AssetPhase,
    /// Committed owner.
    pub owner: Option<Holder>,
    /// Creator while the create is pending.
    pub pending_owner: Option<Holder>,
    /// Buyer that recorded an agreement.
    pub buyer: Option<Holder>,
    /// Completed transfers.
    pub transfers: u32,
}

impl AssetLifecycle {
    /// Lifecycle of an asset that does not exist yet.
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            phase: AssetPhase::NonExistent,
            owner: None,
            pending_owner: None,
            buyer: None,
            transfers: 0,
        }
    }

    /// Lifecycle of an asset already committed under `owner`.
    pub fn committed(asset_id: impl Into<String>, owner: Holder) -> Self {
        Self {
            phase: AssetPhase::PrivateOwned,
            owner: Some(owner),
            ..Self::new(asset_id)
        }
    }

    /// Transition to new phase.
    pub fn transition_to(&mut self, next: AssetPhase) -> Result<(), AssetStateError> {
        if !self.phase.can_transition_to(next) {
            return Err(AssetStateError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// `NonExistent → PrivatePending`.
    pub fn submit_create(&mut self, creator: Holder) -> Result<(), AssetStateError> {
        if self.phase != AssetPhase::NonExistent {
            return Err(AssetStateError::AssetAlreadyExists(self.asset_id.clone()));
        }
        self.transition_to(AssetPhase::PrivatePending)?;
        self.pending_owner = Some(creator);
        Ok(())
    }

    /// `PrivatePending → PrivateOwned(creator)`.
    pub fn confirm_commit(&mut self) -> Result<(), AssetStateError> {
        self.transition_to(AssetPhase::PrivateOwned)?;
        self.owner = self.pending_owner.take();
        Ok(())
    }

    /// `PrivateOwned → TransferAgreed`. The buyer must be another organization.
    pub fn record_agreement(&mut self, buyer: Holder) -> Result<(), AssetStateError> {
        if self.owner_msp() == Some(&buyer.msp_id) {
            return Err(AssetStateError::OwnerCannotAgree {
                asset_id: self.asset_id.clone(),
                msp: buyer.msp_id.to_string(),
            });
        }
        self.transition_to(AssetPhase::TransferAgreed)?;
        self.buyer = Some(buyer);
        Ok(())
    }

    /// `TransferAgreed → PrivateOwned(buyer)`. Returns the new owner.
    ///
    /// Without an agreement this fails and leaves the owner untouched.
    pub fn complete_transfer(&mut self, buyer_msp: &MspId) -> Result<Holder, AssetStateError> {
        if self.owner_msp() == Some(buyer_msp) {
            return Err(AssetStateError::SelfTransfer {
                asset_id: self.asset_id.clone(),
                msp: buyer_msp.to_string(),
            });
        }
        match (&self.phase, &self.buyer) {
            (AssetPhase::TransferAgreed, Some(buyer)) if &buyer.msp_id != buyer_msp => {
                return Err(AssetStateError::BuyerMismatch {
                    asset_id: self.asset_id.clone(),
                    agreed: buyer.msp_id.to_string(),
                    requested: buyer_msp.to_string(),
                });
            }
            (AssetPhase::TransferAgreed, Some(_)) => {}
            (AssetPhase::PrivateOwned, _) => {
                return Err(AssetStateError::AgreementMissing {
                    asset_id: self.asset_id.clone(),
                    collection: buyer_msp.private_collection(),
                });
            }
            (phase, _) => {
                return Err(AssetStateError::InvalidTransition {
                    from: phase.to_string(),
                    to: AssetPhase::PrivateOwned.to_string(),
                });
            }
        }

        self.transition_to(AssetPhase::PrivateOwned)?;
        let new_owner = self.buyer.take().ok_or_else(|| AssetStateError::AgreementMissing {
            asset_id: self.asset_id.clone(),
            collection: buyer_msp.private_collection(),
        })?;
        self.owner = Some(new_owner.clone());
        self.transfers += 1;
        Ok(new_owner)
    }

    /// Organization of the committed owner.
    pub fn owner_msp(&self) -> Option<&MspId> {
        self.owner.as_ref().map(|h| &h.msp_id)
    }

    /// Whether `holder` is the committed owner.
    pub fn is_owned_by(&self, holder: &Holder) -> bool {
        self.owner.as_ref() == Some(holder)
    }
}
