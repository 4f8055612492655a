//! # Shared Types Crate
//!
//! Ledger records, transient payloads, contract operation names and
//! organization identity used across the private asset transfer crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the JSON shapes exchanged with the contract
//!   are defined once, here.
//! - **Public / private split**: `Asset` never carries the secret; the secret
//!   only travels in `AssetPrivateDetails` and transient payloads.
//! - **Redacted secrets**: `AssetSecret` never prints its value.

pub mod entities;
pub mod errors;
pub mod identity;
pub mod operations;

pub use entities::*;
pub use errors::*;
pub use identity::*;
pub use operations::*;
