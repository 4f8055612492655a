//! # Run Report
//!
//! What a completed run observed, step by step.

use super::step::Step;
use shared_types::{
    Asset, AssetHistoryEntry, AssetPrivateDetails, MspId, RejectionCode, TransferAgreement,
};
use std::fmt;

/// How the deliberate pre-agreement transfer failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NegativePathOutcome {
    /// The contract rejected the transfer, as intended.
    Rejected {
        /// Contract rejection message
        message: String,
    },
    /// The contract rejected the transfer for a reason other than the
    /// missing agreement, so the rejection does not show the guard works.
    UnexpectedRejection {
        /// Reason code of the rejection
        code: RejectionCode,
        /// Contract rejection message
        message: String,
    },
    /// The call failed for another reason (transport, timeout). The
    /// contract's verdict is unknown.
    Degraded {
        /// Error text
        error: String,
    },
}

impl NegativePathOutcome {
    /// Whether the intended validation rejection was observed.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Log label: `rejected`, `unexpected_rejection` or `degraded`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::UnexpectedRejection { .. } => "unexpected_rejection",
            Self::Degraded { .. } => "degraded",
        }
    }
}

impl fmt::Display for NegativePathOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { message } => write!(f, "rejected: {message}"),
            Self::UnexpectedRejection { code, message } => {
                write!(f, "unexpected rejection ({code}): {message}")
            }
            Self::Degraded { error } => write!(f, "degraded: {error}"),
        }
    }
}

/// Result of reading a collection the caller never owned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForeignReadOutcome {
    /// The read returned no data.
    Empty,
    /// The ledger refused the read.
    Denied,
}

/// Seller's private copy after the transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SellerCopyStatus {
    /// Read back empty.
    Absent,
    /// Not read.
    NotChecked,
}

/// Observations of a successful run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Run id
    pub run_id: String,
    /// Asset created and transferred
    pub asset_id: String,
    /// Selling organization
    pub seller: MspId,
    /// Buying organization
    pub buyer: MspId,
    /// `GetAllAssets` after `InitLedger`
    pub ledger_assets: Vec<Asset>,
    /// Public record right after creation
    pub created: Asset,
    /// Outcome of the pre-agreement transfer
    pub negative_path: NegativePathOutcome,
    /// Buyer's read of the seller's collection before agreeing
    pub foreign_read: ForeignReadOutcome,
    /// Agreement as read back
    pub agreement: TransferAgreement,
    /// Public record after the transfer
    pub transferred: Asset,
    /// Buyer's private copy after the transfer
    pub buyer_details: AssetPrivateDetails,
    /// Seller's private copy after the transfer
    pub seller_copy: SellerCopyStatus,
    /// Asset history, oldest first
    pub history: Vec<AssetHistoryEntry>,
    /// Steps completed, in order
    pub completed: Vec<Step>,
}

impl RunReport {
    /// Whether every protocol step completed.
    pub fn is_complete(&self) -> bool {
        self.completed == Step::SEQUENCE
    }
}
