//! # Outbound Ports
//!
//! The Transaction Gateway collaborator as seen by the transfer protocol:
//! submit or evaluate a named operation for one acting identity.

use async_trait::async_trait;
use shared_types::{GatewayError, IdentityContext, Invocation};

/// Connection to the contract for one organization - outbound port.
///
/// A gateway is bound to exactly one `IdentityContext`. Once
/// `disconnect` has been called every further call fails with
/// `GatewayError::Closed`.
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Identity this gateway acts for.
    fn context(&self) -> &IdentityContext;

    /// Endorse, order and commit a ledger-writing operation.
    ///
    /// Returns once the transaction has committed and is visible to reads
    /// made through this same gateway.
    async fn submit(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError>;

    /// Run a read-only query against the organization's peer.
    async fn evaluate(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError>;

    /// Release the connection. Idempotent.
    fn disconnect(&self);

    /// Whether the connection is still open.
    fn is_connected(&self) -> bool;
}

/// Opens gateways - outbound port.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    /// Gateway type produced by this connector.
    type Gateway: TransactionGateway + 'static;

    /// Open a connection for `context`.
    async fn connect(&self, context: &IdentityContext) -> Result<Self::Gateway, GatewayError>;
}
