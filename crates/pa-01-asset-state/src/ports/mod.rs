//! # Ports Module
//!
//! Hexagonal architecture ports (inbound contract API, outbound gateway).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
