//! Error types for the transfer protocol

use crate::config::ConfigError;
use crate::domain::Step;
use crate::verification::VerificationError;
use pa_01_asset_state::AssetStateError;
use shared_types::GatewayError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that terminate a run
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// Connectivity, endorsement or commit failure.
    #[error("{step}: transport failure: {source}")]
    Transport {
        /// Failing step
        step: Step,
        /// Gateway error
        source: GatewayError,
    },

    /// The contract rejected the call outside the negative path.
    #[error("{step}: {operation} rejected by contract: {message}")]
    ValidationRejection {
        /// Failing step
        step: Step,
        /// Contract operation
        operation: String,
        /// Contract message
        message: String,
    },

    /// A result did not match the expected state.
    #[error("{step}: verification failed: {source}")]
    Verification {
        /// Failing step
        step: Step,
        /// What did not match
        source: VerificationError,
    },

    /// A read returned no data where data was required.
    #[error("{step}: {record} returned no data")]
    EmptyResult {
        /// Failing step
        step: Step,
        /// Record kind
        record: &'static str,
    },

    /// The step is not allowed in the asset's current phase.
    #[error("{step}: {source}")]
    State {
        /// Failing step
        step: Step,
        /// Lifecycle error
        source: AssetStateError,
    },

    /// The negative path committed.
    #[error("{step}: {operation} committed but must be rejected before an agreement exists")]
    UnexpectedSuccess {
        /// Failing step
        step: Step,
        /// Contract operation
        operation: String,
    },

    /// A request payload could not be encoded.
    #[error("{step}: failed to encode request: {reason}")]
    Encoding {
        /// Failing step
        step: Step,
        /// Encoder message
        reason: String,
    },

    /// The run deadline passed.
    #[error("run timed out after {after:?}")]
    Timeout {
        /// Configured deadline
        after: Duration,
    },

    /// The run configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ProtocolError {
    /// Classify a gateway failure: contract rejections become
    /// `ValidationRejection`, everything else `Transport`.
    pub fn from_gateway(step: Step, error: GatewayError) -> Self {
        match error {
            GatewayError::ContractRejected {
                operation,
                message,
                ..
            } => Self::ValidationRejection {
                step,
                operation,
                message,
            },
            source => Self::Transport { step, source },
        }
    }

    /// Lift a verification failure, keeping empty results apart.
    pub fn from_verification(step: Step, error: VerificationError) -> Self {
        match error {
            VerificationError::EmptyResult { record } => Self::EmptyResult { step, record },
            source => Self::Verification { step, source },
        }
    }

    /// Step the run failed in.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Transport { step, .. }
            | Self::ValidationRejection { step, .. }
            | Self::Verification { step, .. }
            | Self::EmptyResult { step, .. }
            | Self::State { step, .. }
            | Self::UnexpectedSuccess { step, .. }
            | Self::Encoding { step, .. } => Some(*step),
            Self::Timeout { .. } | Self::Config(_) => None,
        }
    }

    /// Offending field for verification mismatches.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Verification { source, .. } => source.field(),
            _ => None,
        }
    }

    /// Error category used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::ValidationRejection { .. } => "validation_rejection",
            Self::Verification { .. } => "verification",
            Self::EmptyResult { .. } => "empty_result",
            Self::State { .. } => "state",
            Self::UnexpectedSuccess { .. } => "unexpected_success",
            Self::Encoding { .. } => "encoding",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "config",
        }
    }

    /// Whether a read may still converge: the data is missing or stale,
    /// not malformed.
    pub fn is_stale_read(&self) -> bool {
        matches!(
            self,
            Self::EmptyResult { .. }
                | Self::Verification {
                    source: VerificationError::FieldMismatch { .. },
                    ..
                }
        )
    }
}
