//! # Integration Tests
//!
//! Whole runs and partial step sequences across both organizations.

pub mod failures;
pub mod policies;
pub mod scenario;
