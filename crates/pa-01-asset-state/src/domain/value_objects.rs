//! # Domain Value Objects
//!
//! Immutable value types for the private asset lifecycle.

use serde::{Deserialize, Serialize};
use shared_types::MspId;
use std::fmt;

/// SHA-256 hash of a private details record.
pub type PrivateDataHash = [u8; 32];

/// Asset lifecycle phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetPhase {
    /// No record exists yet.
    #[default]
    NonExistent,
    /// Create submitted, not yet committed.
    PrivatePending,
    /// Committed and owned by one organization.
    PrivateOwned,
    /// A prospective buyer has recorded an agreement.
    TransferAgreed,
}

impl AssetPhase {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: AssetPhase) -> bool {
        match (self, next) {
            (Self::NonExistent, Self::PrivatePending) => true,
            (Self::PrivatePending, Self::PrivateOwned) => true,
            (Self::PrivateOwned, Self::TransferAgreed) => true,
            // A buyer may restate its agreement before the transfer
            (Self::TransferAgreed, Self::TransferAgreed) => true,
            // Transfer: ownership moves to the buyer, cycle restarts
            (Self::TransferAgreed, Self::PrivateOwned) => true,
            _ => false,
        }
    }

    /// Whether public reads can observe the asset in this phase.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::PrivateOwned | Self::TransferAgreed)
    }
}

impl fmt::Display for AssetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An organization/user pair holding (or about to hold) an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// Organization.
    pub msp_id: MspId,
    /// User identifier within the organization.
    pub user_id: String,
}

impl Holder {
    /// Create a new holder.
    pub fn new(msp_id: MspId, user_id: impl Into<String>) -> Self {
        Self {
            msp_id,
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_id, self.msp_id)
    }
}
