//! # Organization Sessions
//!
//! A scoped handle on one organization's gateway connection. The connection
//! is released by `release`, or on drop when the run ends early (fatal error
//! in another step, timeout).

use pa_01_asset_state::{GatewayConnector, TransactionGateway};
use shared_types::{GatewayError, IdentityContext, Invocation, MspId};
use std::fmt;
use tracing::{debug, info};

/// Part an organization plays in the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Creates and transfers the asset.
    Seller,
    /// Agrees to buy and receives the asset.
    Buyer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Seller => f.write_str("seller"),
            Role::Buyer => f.write_str("buyer"),
        }
    }
}

/// One organization's open connection, owned by the orchestrator.
pub struct OrgSession<G: TransactionGateway> {
    gateway: G,
    role: Role,
    released: bool,
}

impl<G: TransactionGateway> OrgSession<G> {
    /// Connect as `context`.
    pub async fn open<C>(connector: &C, context: &IdentityContext, role: Role) -> Result<Self, GatewayError>
    where
        C: GatewayConnector<Gateway = G>,
    {
        let gateway = connector.connect(context).await?;
        info!(
            org = %context.msp_id(),
            user = context.user_id(),
            %role,
            "Session opened"
        );
        Ok(Self {
            gateway,
            role,
            released: false,
        })
    }

    /// Acting organization.
    pub fn msp_id(&self) -> &MspId {
        self.gateway.context().msp_id()
    }

    /// Acting user.
    pub fn user_id(&self) -> &str {
        self.gateway.context().user_id()
    }

    /// This organization's private collection.
    pub fn private_collection(&self) -> String {
        self.gateway.context().private_collection()
    }

    /// Role in the run.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Submit through this organization's gateway.
    pub async fn submit(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.gateway.submit(invocation).await
    }

    /// Evaluate through this organization's gateway.
    pub async fn evaluate(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.gateway.evaluate(invocation).await
    }

    /// Release the connection.
    pub fn release(mut self) {
        self.close("released");
    }

    fn close(&mut self, how: &str) {
        if !self.released {
            self.released = true;
            self.gateway.disconnect();
            debug!(org = %self.msp_id(), role = %self.role, "Session {how}");
        }
    }
}

impl<G: TransactionGateway> Drop for OrgSession<G> {
    fn drop(&mut self) {
        self.close("released on drop");
    }
}

impl<G: TransactionGateway> fmt::Debug for OrgSession<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrgSession")
            .field("org", self.msp_id())
            .field("role", &self.role)
            .field("released", &self.released)
            .finish()
    }
}
