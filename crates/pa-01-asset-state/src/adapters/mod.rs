//! # Adapters Module
//!
//! In-process implementations of the ports: the simulated ledger running the
//! contract, the invocation router and the local gateway.

pub mod contract_router;
pub mod in_memory_ledger;
pub mod local_gateway;

pub use contract_router::ContractRouter;
pub use in_memory_ledger::{is_base_asset, ForeignCollectionPolicy, InMemoryLedger, LedgerConfig};
pub use local_gateway::{FaultPlan, LocalConnector, LocalGateway};
