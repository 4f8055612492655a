//! # Private Asset Transfer Test Suite
//!
//! Unified test crate driving the orchestrator against the in-memory ledger
//! through the gateway ports only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Builders, contract and gateway doubles
//! ├── properties.rs     # Generated-input properties (creation, pre-agreement rejection)
//! └── integration/      # End-to-end runs
//!     ├── scenario.rs   # Literal scenario, agreement visibility, read idempotence
//!     ├── failures.rs   # Fatal paths, fault injection, timeout, session release
//!     └── policies.rs   # Gossip lag, foreign reads, seller copy
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pa-tests
//!
//! # By category
//! cargo test -p pa-tests integration::
//! cargo test -p pa-tests properties::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
pub mod properties;
