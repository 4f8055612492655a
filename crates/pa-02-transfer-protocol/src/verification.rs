//! # Verification Layer
//!
//! Pure checks of contract results against expected values.
//!
//! An empty payload is `VerificationError::EmptyResult`, kept apart from a
//! payload that parses but is wrong (`FieldMismatch`) or does not parse at
//! all (`Malformed`). Callers decide whether an empty result is fatal.

use serde::de::DeserializeOwned;
use shared_types::{Asset, AssetHistoryEntry, AssetPrivateDetails, AssetSecret, TransferAgreement};
use thiserror::Error;

const REDACTED: &str = "<redacted>";

/// A result that does not match the expected state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// No data came back.
    #[error("received empty {record}")]
    EmptyResult {
        /// Record kind
        record: &'static str,
    },

    /// Data came back but is not a valid record.
    #[error("malformed {record}: {reason}")]
    Malformed {
        /// Record kind
        record: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A field differs from the expected value.
    #[error("{record} field {field}: expected {expected}, got {actual}")]
    FieldMismatch {
        /// Record kind
        record: &'static str,
        /// Offending field
        field: &'static str,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A record is present where none may be.
    #[error("{record} unexpectedly present in {location}")]
    UnexpectedRecord {
        /// Record kind
        record: &'static str,
        /// Collection or view that was read
        location: String,
    },
}

impl VerificationError {
    /// Whether the result was simply empty.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult { .. })
    }

    /// Offending field, for mismatches.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::FieldMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Expected public asset fields.
#[derive(Clone, Debug)]
pub struct ExpectedAsset<'a> {
    /// Asset id
    pub asset_id: &'a str,
    /// Color
    pub color: &'a str,
    /// Size
    pub size: u32,
    /// Text the owner field must contain
    pub owner_contains: &'a str,
    /// Appraised value, checked only when present
    pub appraised_value: Option<u64>,
}

/// Decode a JSON record, mapping an empty payload (or JSON `null`) to
/// `EmptyResult`.
pub fn decode_record<T: DeserializeOwned>(
    payload: &[u8],
    record: &'static str,
) -> Result<T, VerificationError> {
    let text = std::str::from_utf8(payload).map_err(|e| VerificationError::Malformed {
        record,
        reason: e.to_string(),
    })?;
    let text = text.trim();
    if text.is_empty() || text == "null" {
        return Err(VerificationError::EmptyResult { record });
    }
    serde_json::from_str(text).map_err(|e| VerificationError::Malformed {
        record,
        reason: e.to_string(),
    })
}

fn mismatch(
    record: &'static str,
    field: &'static str,
    expected: impl ToString,
    actual: impl ToString,
) -> VerificationError {
    VerificationError::FieldMismatch {
        record,
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Verify a `ReadAsset` payload.
pub fn verify_public_asset(
    payload: &[u8],
    expected: &ExpectedAsset<'_>,
) -> Result<Asset, VerificationError> {
    const RECORD: &str = "asset";
    let asset: Asset = decode_record(payload, RECORD)?;

    if asset.asset_id != expected.asset_id {
        return Err(mismatch(RECORD, "assetID", expected.asset_id, &asset.asset_id));
    }
    if asset.color != expected.color {
        return Err(mismatch(RECORD, "color", expected.color, &asset.color));
    }
    if asset.size != expected.size {
        return Err(mismatch(RECORD, "size", expected.size, asset.size));
    }
    if !asset.is_owned_by(expected.owner_contains) {
        return Err(mismatch(
            RECORD,
            "owner",
            format!("containing {}", expected.owner_contains),
            &asset.owner,
        ));
    }
    if let Some(value) = expected.appraised_value {
        if asset.appraised_value != value {
            return Err(mismatch(RECORD, "appraisedValue", value, asset.appraised_value));
        }
    }
    Ok(asset)
}

/// Verify a `ReadAssetPrivateDetails` payload. The secret is compared only
/// when `expected_secret` is given and is never echoed in the error.
pub fn verify_private_details(
    payload: &[u8],
    expected_id: &str,
    expected_secret: Option<&AssetSecret>,
) -> Result<AssetPrivateDetails, VerificationError> {
    const RECORD: &str = "private details";
    let details: AssetPrivateDetails = decode_record(payload, RECORD)?;

    if details.asset_id != expected_id {
        return Err(mismatch(RECORD, "assetID", expected_id, &details.asset_id));
    }
    if let Some(secret) = expected_secret {
        if &details.secret != secret {
            return Err(mismatch(RECORD, "secret", REDACTED, REDACTED));
        }
    }
    Ok(details)
}

/// Verify a `ReadTransferAgreement` payload.
pub fn verify_agreement(
    payload: &[u8],
    expected_id: &str,
    buyer_contains: &str,
) -> Result<TransferAgreement, VerificationError> {
    const RECORD: &str = "transfer agreement";
    let agreement: TransferAgreement = decode_record(payload, RECORD)?;

    if agreement.asset_id != expected_id {
        return Err(mismatch(RECORD, "assetID", expected_id, &agreement.asset_id));
    }
    if buyer_contains.is_empty() || !agreement.buyer_id.contains(buyer_contains) {
        return Err(mismatch(
            RECORD,
            "buyerID",
            format!("containing {buyer_contains}"),
            &agreement.buyer_id,
        ));
    }
    Ok(agreement)
}

/// Verify a `GetAssetHistory` payload: non-empty, ordered by block, and the
/// latest version owned by `latest_owner_contains`.
pub fn verify_history(
    payload: &[u8],
    expected_id: &str,
    latest_owner_contains: &str,
) -> Result<Vec<AssetHistoryEntry>, VerificationError> {
    const RECORD: &str = "asset history";
    let history: Vec<AssetHistoryEntry> = decode_record(payload, RECORD)?;

    let latest = history
        .last()
        .ok_or(VerificationError::EmptyResult { record: RECORD })?;
    if let Some(pair) = history
        .windows(2)
        .find(|pair| pair[0].block_number > pair[1].block_number)
    {
        return Err(mismatch(
            RECORD,
            "blockNumber",
            format!(">= {}", pair[0].block_number),
            pair[1].block_number,
        ));
    }
    for entry in &history {
        if let Some(value) = &entry.value {
            if value.asset_id != expected_id {
                return Err(mismatch(RECORD, "assetID", expected_id, &value.asset_id));
            }
        }
    }

    match &latest.value {
        Some(value) if value.is_owned_by(latest_owner_contains) => Ok(history),
        Some(value) => Err(mismatch(
            RECORD,
            "owner",
            format!("containing {latest_owner_contains}"),
            &value.owner,
        )),
        None => Err(mismatch(RECORD, "isDelete", false, latest.is_delete)),
    }
}

/// Verify that a private details read came back empty.
pub fn verify_absent(payload: &[u8], location: &str) -> Result<(), VerificationError> {
    const RECORD: &str = "private details";
    match decode_record::<AssetPrivateDetails>(payload, RECORD) {
        Err(VerificationError::EmptyResult { .. }) => Ok(()),
        Err(e) => Err(e),
        Ok(_) => Err(VerificationError::UnexpectedRecord {
            record: RECORD,
            location: location.to_string(),
        }),
    }
}

/// Decode a `GetAllAssets` payload. An empty list is valid.
pub fn decode_assets(payload: &[u8]) -> Result<Vec<Asset>, VerificationError> {
    decode_record(payload, "asset list")
}

/// Decode an `AssetExists` payload.
pub fn decode_exists(payload: &[u8]) -> Result<bool, VerificationError> {
    decode_record(payload, "existence flag")
}
