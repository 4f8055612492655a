//! # Algorithms Module
//!
//! Private data hashing and client identity parsing used by the contract.

pub mod client_identity;
pub mod private_hash;

pub use client_identity::extract_common_name;
pub use private_hash::{hash_hex, private_data_hash};
