//! # Error Types
//!
//! Failures surfaced by the Transaction Gateway collaborator.

use std::fmt;
use thiserror::Error;

/// Machine-readable reason carried by a contract rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionCode {
    /// Transfer attempted before the buyer recorded an agreement.
    AgreementMissing,
    /// The buyer's proof of secret does not match the owner's.
    AgreementMismatch,
    /// Caller lacks ownership, role or collection access.
    Unauthorized,
    /// The asset already exists, does not exist, or is in the wrong phase.
    StateConflict,
    /// Missing or malformed transient data, arguments or fields.
    InvalidRequest,
    /// Any other contract failure.
    Other,
}

impl RejectionCode {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgreementMissing => "agreement_missing",
            Self::AgreementMismatch => "agreement_mismatch",
            Self::Unauthorized => "unauthorized",
            Self::StateConflict => "state_conflict",
            Self::InvalidRequest => "invalid_request",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a gateway `submit` / `evaluate` / `connect`.
///
/// `ContractRejected` is the only variant produced by contract logic; all
/// other variants describe connectivity, endorsement or commit trouble.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The contract executed and returned an error (precondition failed).
    #[error("{operation} rejected by contract: {message}")]
    ContractRejected {
        operation: String,
        code: RejectionCode,
        message: String,
    },

    /// Could not reach the organization's peer or gateway.
    #[error("Gateway unavailable for {org}: {reason}")]
    Unavailable { org: String, reason: String },

    /// Endorsement could not be collected.
    #[error("Endorsement failed for {operation}: {reason}")]
    EndorsementFailed { operation: String, reason: String },

    /// The transaction was ordered but did not commit as valid.
    #[error("Transaction {tx_id} failed to commit: {status}")]
    CommitFailed { tx_id: String, status: String },

    /// The call did not complete in time.
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// The connection was already released.
    #[error("Gateway connection for {org} is closed")]
    Closed { org: String },
}

impl GatewayError {
    /// Whether the error is a contract-level rejection rather than a
    /// transport problem.
    pub fn is_contract_rejection(&self) -> bool {
        matches!(self, GatewayError::ContractRejected { .. })
    }

    /// Rejection code, for contract rejections only.
    pub fn rejection_code(&self) -> Option<RejectionCode> {
        match self {
            GatewayError::ContractRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
