//! # Private Data Hashing
//!
//! Every member can read the hash of a private record without reading the
//! record itself. The transfer check compares these hashes, so the secret
//! never leaves the owning organization.

use crate::domain::{AssetStateError, PrivateDataHash};
use sha2::{Digest, Sha256};
use shared_types::AssetPrivateDetails;

/// SHA-256 of the stored JSON encoding of `details`.
///
/// Both sides store the record through the same encoder, so equal
/// `{assetID, secret}` pairs always hash equally.
pub fn private_data_hash(details: &AssetPrivateDetails) -> Result<PrivateDataHash, AssetStateError> {
    let bytes = serde_json::to_vec(details)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    Ok(hash)
}

/// Lowercase hex rendering used in rejection messages.
pub fn hash_hex(hash: &PrivateDataHash) -> String {
    hex::encode(hash)
}
