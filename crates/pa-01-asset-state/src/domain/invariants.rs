//! # Domain Invariants
//!
//! Consistency rules between the public asset record, the private
//! collections and the transfer agreement. Checked by the ledger before a
//! transfer commits and by tests after each step.

use super::errors::AssetStateError;
use super::value_objects::PrivateDataHash;
use shared_types::{Asset, AssetPrivateDetails, AssetSecret};

/// Invariant: private `assetID` equals the public `assetID`.
pub fn invariant_private_matches_public(
    asset: &Asset,
    details: &AssetPrivateDetails,
) -> Result<(), AssetStateError> {
    if asset.asset_id != details.asset_id {
        return Err(AssetStateError::InvariantViolation {
            invariant: "private-matches-public",
            detail: format!(
                "private assetID {} paired with public assetID {}",
                details.asset_id, asset.asset_id
            ),
        });
    }
    Ok(())
}

/// Invariant: a transfer needs the buyer's copy of the private details, and
/// its hash must equal the hash of the owner's copy.
///
/// A missing owner copy is reported before a missing buyer copy, matching
/// the order in which the contract reads the two collections.
pub fn invariant_agreement_matches(
    asset_id: &str,
    owner_hash: Option<&PrivateDataHash>,
    owner_collection: &str,
    buyer_hash: Option<&PrivateDataHash>,
    buyer_collection: &str,
) -> Result<(), AssetStateError> {
    let owner_hash = owner_hash.ok_or_else(|| AssetStateError::PrivateDetailsMissing {
        asset_id: asset_id.to_string(),
        collection: owner_collection.to_string(),
    })?;
    let buyer_hash = buyer_hash.ok_or_else(|| AssetStateError::AgreementMissing {
        asset_id: asset_id.to_string(),
        collection: buyer_collection.to_string(),
    })?;

    if owner_hash != buyer_hash {
        return Err(AssetStateError::AgreementMismatch {
            asset_id: asset_id.to_string(),
            owner_hash: hex::encode(owner_hash),
            buyer_hash: hex::encode(buyer_hash),
        });
    }
    Ok(())
}

/// Invariant: after a transfer the public owner names the buyer and the
/// buyer's collection holds the original secret.
pub fn invariant_transfer_effect(
    asset: &Asset,
    buyer_user: &str,
    buyer_details: Option<&AssetPrivateDetails>,
    expected_secret: &AssetSecret,
) -> Result<(), AssetStateError> {
    if !asset.is_owned_by(buyer_user) {
        return Err(AssetStateError::InvariantViolation {
            invariant: "transfer-effect",
            detail: format!("owner {} does not contain buyer {}", asset.owner, buyer_user),
        });
    }

    let details = buyer_details.ok_or_else(|| AssetStateError::InvariantViolation {
        invariant: "transfer-effect",
        detail: format!("buyer collection holds no private details for {}", asset.asset_id),
    })?;
    invariant_private_matches_public(asset, details)?;

    if &details.secret != expected_secret {
        return Err(AssetStateError::InvariantViolation {
            invariant: "transfer-effect",
            detail: format!("buyer copy of {} carries a different secret", asset.asset_id),
        });
    }
    Ok(())
}
