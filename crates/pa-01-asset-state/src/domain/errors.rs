//! # Domain Errors
//!
//! Rejections raised by the asset lifecycle and the contract operations.
//! The `Display` text is what a caller sees inside a contract rejection.

use shared_types::RejectionCode;
use thiserror::Error;

/// Asset state machine and contract errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetStateError {
    /// Transition not allowed from the current phase.
    #[error("Invalid asset transition: {from} -> {to}")]
    InvalidTransition {
        /// Current phase
        from: String,
        /// Attempted phase
        to: String,
    },

    /// No public record for this asset.
    #[error("asset {0} does not exist")]
    AssetNotFound(String),

    /// Retailers may not register assets.
    #[error("submitting client not authorized to create asset: client is a Retailer")]
    RetailerCannotCreate,

    /// Only Farmers may register assets.
    #[error("submitting client not authorized to create asset: client is not a Farmer")]
    NotFarmer,

    /// Create on an id that is already taken.
    #[error("this asset already exists: {0}")]
    AssetAlreadyExists(String),

    /// Caller is not the current owner.
    #[error("submitting client {client} not authorized to transfer asset {asset_id}, does not own asset")]
    NotOwner {
        /// Asset id
        asset_id: String,
        /// Caller user id
        client: String,
    },

    /// Owner organization tried to agree to buy its own asset.
    #[error("owner organization {msp} cannot agree to transfer its own asset {asset_id}")]
    OwnerCannotAgree {
        /// Asset id
        asset_id: String,
        /// Owner MSP
        msp: String,
    },

    /// Transfer to the organization that already owns the asset.
    #[error("cannot transfer asset {asset_id} to its current owner organization {msp}")]
    SelfTransfer {
        /// Asset id
        asset_id: String,
        /// Owner MSP
        msp: String,
    },

    /// The buyer never ran AgreeToTransfer.
    #[error("hash of private details for {asset_id} does not exist in collection {collection}. AgreeToTransfer must be called by the buyer first")]
    AgreementMissing {
        /// Asset id
        asset_id: String,
        /// Buyer collection that was checked
        collection: String,
    },

    /// The buyer's proof of secret does not match the owner's secret.
    #[error("hash of private details for {asset_id} in buyer collection ({buyer_hash}) does not match owner collection ({owner_hash})")]
    AgreementMismatch {
        /// Asset id
        asset_id: String,
        /// Hex hash of the owner's details
        owner_hash: String,
        /// Hex hash of the buyer's details
        buyer_hash: String,
    },

    /// Agreement exists but was made by a different organization.
    #[error("transfer agreement for {asset_id} was made by {agreed}, not {requested}")]
    BuyerMismatch {
        /// Asset id
        asset_id: String,
        /// MSP that agreed
        agreed: String,
        /// MSP named in the transfer
        requested: String,
    },

    /// Owner's private copy is absent.
    #[error("private details for {asset_id} do not exist in collection {collection}")]
    PrivateDetailsMissing {
        /// Asset id
        asset_id: String,
        /// Collection that was checked
        collection: String,
    },

    /// Caller may not read this collection.
    #[error("client from {msp} does not have read access permission for collection {collection}")]
    CollectionAccessDenied {
        /// Caller MSP
        msp: String,
        /// Requested collection
        collection: String,
    },

    /// Unknown collection name.
    #[error("collection {0} is not defined for this contract")]
    UnknownCollection(String),

    /// Required transient key missing.
    #[error("{0} key not found in the transient map")]
    MissingTransient(String),

    /// Transient payload could not be decoded.
    #[error("failed to unmarshal {key}: {reason}")]
    MalformedTransient {
        /// Transient key
        key: String,
        /// Decoder message
        reason: String,
    },

    /// Field failed validation.
    #[error("{field} field {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Reason
        reason: String,
    },

    /// Wrong positional arguments.
    #[error("incorrect arguments for {operation}: expected {expected}, got {got}")]
    InvalidArguments {
        /// Operation name
        operation: String,
        /// Expected count
        expected: usize,
        /// Received count
        got: usize,
    },

    /// Operation must go through submit, not evaluate.
    #[error("{0} writes to the ledger and must be submitted")]
    SubmitRequired(String),

    /// A lifecycle invariant does not hold.
    #[error("Invariant {invariant} violated: {detail}")]
    InvariantViolation {
        /// Invariant name
        invariant: &'static str,
        /// What was observed
        detail: String,
    },

    /// Record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AssetStateError {
    /// Reason code reported with the contract rejection.
    pub fn rejection_code(&self) -> RejectionCode {
        match self {
            Self::AgreementMissing { .. } => RejectionCode::AgreementMissing,
            Self::AgreementMismatch { .. } => RejectionCode::AgreementMismatch,
            Self::NotOwner { .. }
            | Self::OwnerCannotAgree { .. }
            | Self::SelfTransfer { .. }
            | Self::BuyerMismatch { .. }
            | Self::CollectionAccessDenied { .. }
            | Self::RetailerCannotCreate
            | Self::NotFarmer => RejectionCode::Unauthorized,
            Self::InvalidTransition { .. }
            | Self::AssetNotFound(_)
            | Self::AssetAlreadyExists(_)
            | Self::PrivateDetailsMissing { .. } => RejectionCode::StateConflict,
            Self::UnknownCollection(_)
            | Self::MissingTransient(_)
            | Self::MalformedTransient { .. }
            | Self::InvalidField { .. }
            | Self::InvalidArguments { .. }
            | Self::SubmitRequired(_) => RejectionCode::InvalidRequest,
            Self::InvariantViolation { .. } | Self::Serialization(_) => RejectionCode::Other,
        }
    }
}

impl From<serde_json::Error> for AssetStateError {
    fn from(err: serde_json::Error) -> Self {
        AssetStateError::Serialization(err.to_string())
    }
}
