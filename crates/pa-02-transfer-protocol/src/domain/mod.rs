//! # Domain Module
//!
//! Protocol steps and the record of a completed run.

pub mod report;
pub mod step;

pub use report::*;
pub use step::*;
