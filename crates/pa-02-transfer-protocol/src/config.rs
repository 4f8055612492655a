//! Configuration types for the transfer protocol

use pa_01_asset_state::is_base_asset;
use serde::{Deserialize, Serialize};
use shared_types::{
    AssetProperties, AssetSecret, IdentityContext, MspId, OrgIdentity, UserRole,
};
use std::time::Duration;
use thiserror::Error;

/// Default number of attempts for a cross-organization read.
pub const DEFAULT_READ_ATTEMPTS: u32 = 5;

/// Default pause between cross-organization read attempts.
pub const DEFAULT_READ_BACKOFF: Duration = Duration::from_millis(50);

/// Default deadline for a whole run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Invalid protocol configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Run id is empty or contains characters not allowed in ids.
    #[error("invalid run id {0:?}: expected ASCII letters, digits, '-' or '_'")]
    InvalidRunId(String),

    /// Run id maps onto an asset seeded by `InitLedger`.
    #[error("asset id {0} is reserved for the seeded base assets")]
    ReservedAssetId(String),

    /// Seller and buyer act for the same organization.
    #[error("seller and buyer must belong to different organizations, both are {0}")]
    SameOrganization(String),

    /// Asset template field out of range.
    #[error("asset template {field} {reason}")]
    InvalidAsset {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },

    /// Retry policy allows no attempt.
    #[error("read retry policy needs at least one attempt")]
    NoReadAttempts,

    /// Zero run timeout.
    #[error("run timeout must be positive")]
    ZeroTimeout,
}

/// Public fields and secret of the asset created by a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetTemplate {
    /// Color
    pub color: String,
    /// Size
    pub size: u32,
    /// Appraised value
    pub appraised_value: u64,
    /// Secret kept in the owner's private collection
    pub secret: AssetSecret,
}

impl Default for AssetTemplate {
    fn default() -> Self {
        Self {
            color: "green".to_string(),
            size: 20,
            appraised_value: 100,
            secret: AssetSecret::new(1234),
        }
    }
}

impl AssetTemplate {
    /// Create payload for `asset_id`.
    pub fn properties(&self, asset_id: impl Into<String>) -> AssetProperties {
        AssetProperties {
            asset_id: asset_id.into(),
            color: self.color.clone(),
            size: self.size,
            appraised_value: self.appraised_value,
            secret: self.secret.clone(),
        }
    }
}

/// Bounded retry for reads of data committed by another organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READ_ATTEMPTS,
            backoff: DEFAULT_READ_BACKOFF,
        }
    }
}

/// What to assert about the seller's private copy after a transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerCopyCheck {
    /// The seller's collection must no longer hold the asset.
    #[default]
    ExpectAbsent,
    /// Do not read the seller's collection after the transfer.
    Skip,
}

/// What counts as "absent" when reading a collection the caller never
/// owned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsentCollectionPolicy {
    /// Only an empty result; an access-denied rejection is fatal.
    EmptyOnly,
    /// Either an empty result or an access-denied rejection.
    #[default]
    EmptyOrDenied,
}

/// Configuration of one protocol run.
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
    /// Run identifier, injected into asset and user ids
    pub run_id: String,
    /// Selling organization (creates and transfers the asset)
    pub seller: IdentityContext,
    /// Buying organization (agrees and receives the asset)
    pub buyer: IdentityContext,
    /// Asset created by the run
    pub asset: AssetTemplate,
    /// Retry for reads of another organization's commits
    pub read_retry: RetryPolicy,
    /// Seller copy assertion after transfer
    pub seller_copy_check: SellerCopyCheck,
    /// Interpretation of foreign-collection reads
    pub absent_collection: AbsentCollectionPolicy,
    /// Deadline for the whole run
    pub run_timeout: Duration,
}

impl ProtocolConfig {
    /// Two-organization run: `Farmer{run_id}` of Org1 sells to
    /// `Retailer{run_id}` of Org2.
    pub fn for_run(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let seller = OrgIdentity::new(MspId::new("Org1MSP"), format!("Farmer{run_id}"), "org1")
            .with_role(UserRole::Farmer);
        let buyer = OrgIdentity::new(MspId::new("Org2MSP"), format!("Retailer{run_id}"), "org2")
            .with_role(UserRole::Retailer);
        Self {
            run_id,
            seller: IdentityContext::new(seller),
            buyer: IdentityContext::new(buyer),
            asset: AssetTemplate::default(),
            read_retry: RetryPolicy::default(),
            seller_copy_check: SellerCopyCheck::default(),
            absent_collection: AbsentCollectionPolicy::default(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Id of the asset created by this run: `asset{run_id}`.
    pub fn asset_id(&self) -> String {
        format!("asset{}", self.run_id)
    }

    /// Check the configuration before any connection is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_id = !self.run_id.is_empty()
            && self
                .run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_id {
            return Err(ConfigError::InvalidRunId(self.run_id.clone()));
        }
        let asset_id = self.asset_id();
        if is_base_asset(&asset_id) {
            return Err(ConfigError::ReservedAssetId(asset_id));
        }
        if self.seller.msp_id() == self.buyer.msp_id() {
            return Err(ConfigError::SameOrganization(self.seller.msp_id().to_string()));
        }
        if self.asset.color.is_empty() {
            return Err(ConfigError::InvalidAsset {
                field: "color",
                reason: "must be non-empty",
            });
        }
        if self.asset.size == 0 {
            return Err(ConfigError::InvalidAsset {
                field: "size",
                reason: "must be positive",
            });
        }
        if self.asset.appraised_value == 0 {
            return Err(ConfigError::InvalidAsset {
                field: "appraisedValue",
                reason: "must be positive",
            });
        }
        if self.read_retry.max_attempts == 0 {
            return Err(ConfigError::NoReadAttempts);
        }
        if self.run_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
