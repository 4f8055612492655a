//! # Test Fixtures
//!
//! Ledger setups, orchestrator builders and contract/gateway doubles shared
//! by the integration and property tests.
//!
//! The doubles wrap the in-memory ledger and bend exactly one behavior each,
//! so a test can show how the orchestrator reacts to a ledger that does not
//! hold up its side of the protocol.

use async_trait::async_trait;
use pa_01_asset_state::{
    AssetContractApi, AssetStateError, CallerContext, FaultPlan, GatewayConnector, InMemoryLedger,
    LedgerConfig, LocalConnector, LocalGateway, TransactionGateway,
};
use pa_02_transfer_protocol::{ProtocolConfig, RetryPolicy, TransferOrchestrator};
use parking_lot::Mutex;
use shared_types::{
    collection_owner, Asset, AssetHistoryEntry, AssetPrivateDetails, AssetProperties,
    ContractOperation, GatewayError, IdentityContext, Invocation, MspId, TransferAgreement,
    TransientMap, TRANSIENT_ASSET_PROPERTIES,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// BUILDERS
// =============================================================================

/// Ledger with immediate cross-organization visibility.
pub fn ledger() -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::default())
}

/// Ledger with the given gossip lag and foreign-read policy.
pub fn ledger_with(config: LedgerConfig) -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::new(config))
}

/// Protocol configuration with a short backoff so retries stay fast.
pub fn fast_config(run_id: &str) -> ProtocolConfig {
    let mut config = ProtocolConfig::for_run(run_id);
    config.read_retry = RetryPolicy {
        max_attempts: config.read_retry.max_attempts,
        backoff: Duration::from_millis(1),
    };
    config
}

/// Orchestrator over `contract` served by a fresh local connector.
pub fn orchestrator(
    contract: Arc<dyn AssetContractApi>,
    config: ProtocolConfig,
) -> (TransferOrchestrator<LocalConnector>, LocalConnector) {
    let connector = LocalConnector::new(contract);
    let orchestrator = TransferOrchestrator::new(connector.clone(), config)
        .unwrap_or_else(|e| panic!("invalid test config: {e}"));
    (orchestrator, connector)
}

/// Orchestrator whose connector consults `faults`.
pub fn faulty_orchestrator(
    contract: Arc<dyn AssetContractApi>,
    config: ProtocolConfig,
    faults: Arc<FaultPlan>,
) -> (TransferOrchestrator<LocalConnector>, LocalConnector) {
    let connector = LocalConnector::new(contract).with_faults(faults);
    let orchestrator = TransferOrchestrator::new(connector.clone(), config)
        .unwrap_or_else(|e| panic!("invalid test config: {e}"));
    (orchestrator, connector)
}

/// Asset properties as the orchestrator would create them for `run_id`.
pub fn properties(config: &ProtocolConfig) -> AssetProperties {
    config.asset.properties(config.asset_id())
}

// =============================================================================
// CONTRACT DOUBLE
// =============================================================================

/// The one behavior a `ContractDouble` bends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Misbehavior {
    /// The first `TransferPrivateAsset` reports success without any effect.
    AcceptFirstTransfer,
    /// Reads of another organization's collection return that
    /// organization's private details.
    LeakForeignCollections,
    /// The seller's private copy stays readable after the transfer.
    KeepSellerCopy,
}

/// In-memory ledger with one bent behavior.
pub struct ContractDouble {
    ledger: InMemoryLedger,
    misbehavior: Misbehavior,
    transfer_swallowed: AtomicBool,
    created: Mutex<HashMap<(MspId, String), AssetPrivateDetails>>,
}

impl ContractDouble {
    /// Wrap a fresh ledger.
    pub fn new(misbehavior: Misbehavior) -> Arc<Self> {
        Arc::new(Self {
            ledger: InMemoryLedger::default(),
            misbehavior,
            transfer_swallowed: AtomicBool::new(false),
            created: Mutex::new(HashMap::new()),
        })
    }

    /// Wrapped ledger.
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    fn remembered(&self, owner: &MspId, asset_id: &str) -> Option<AssetPrivateDetails> {
        self.created
            .lock()
            .get(&(owner.clone(), asset_id.to_string()))
            .cloned()
    }
}

impl AssetContractApi for ContractDouble {
    fn init_ledger(&self, caller: &CallerContext) -> Result<(), AssetStateError> {
        self.ledger.init_ledger(caller)
    }

    fn get_all_assets(&self, caller: &CallerContext) -> Result<Vec<Asset>, AssetStateError> {
        self.ledger.get_all_assets(caller)
    }

    fn create_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        self.ledger.create_private_asset(caller, transient)?;
        let props: AssetProperties = transient
            .get(TRANSIENT_ASSET_PROPERTIES)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
            .ok_or_else(|| AssetStateError::MissingTransient(TRANSIENT_ASSET_PROPERTIES.into()))?;
        self.created.lock().insert(
            (caller.msp_id.clone(), props.asset_id.clone()),
            props.private_details(),
        );
        Ok(())
    }

    fn read_asset(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<Asset>, AssetStateError> {
        self.ledger.read_asset(caller, asset_id)
    }

    fn asset_exists(&self, caller: &CallerContext, asset_id: &str) -> Result<bool, AssetStateError> {
        self.ledger.asset_exists(caller, asset_id)
    }

    fn read_asset_private_details(
        &self,
        caller: &CallerContext,
        collection: &str,
        asset_id: &str,
    ) -> Result<Option<AssetPrivateDetails>, AssetStateError> {
        let found = self
            .ledger
            .read_asset_private_details(caller, collection, asset_id)?;
        if found.is_some() {
            return Ok(found);
        }
        let Some(owner) = collection_owner(collection) else {
            return Ok(None);
        };
        match self.misbehavior {
            Misbehavior::LeakForeignCollections if owner != caller.msp_id => {
                Ok(self.remembered(&owner, asset_id))
            }
            Misbehavior::KeepSellerCopy if owner == caller.msp_id => {
                Ok(self.remembered(&owner, asset_id))
            }
            _ => Ok(None),
        }
    }

    fn agree_to_transfer(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        self.ledger.agree_to_transfer(caller, transient)
    }

    fn read_transfer_agreement(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Option<TransferAgreement>, AssetStateError> {
        self.ledger.read_transfer_agreement(caller, asset_id)
    }

    fn transfer_private_asset(
        &self,
        caller: &CallerContext,
        transient: &TransientMap,
    ) -> Result<(), AssetStateError> {
        if self.misbehavior == Misbehavior::AcceptFirstTransfer
            && !self.transfer_swallowed.swap(true, Ordering::SeqCst)
        {
            return Ok(());
        }
        self.ledger.transfer_private_asset(caller, transient)
    }

    fn get_asset_history(
        &self,
        caller: &CallerContext,
        asset_id: &str,
    ) -> Result<Vec<AssetHistoryEntry>, AssetStateError> {
        self.ledger.get_asset_history(caller, asset_id)
    }
}

// =============================================================================
// GATEWAY DOUBLE
// =============================================================================

/// Connector whose gateways stall before one operation.
#[derive(Clone, Debug)]
pub struct SlowConnector {
    inner: LocalConnector,
    operation: ContractOperation,
    delay: Duration,
}

impl SlowConnector {
    /// Stall every `operation` call by `delay`.
    pub fn new(inner: LocalConnector, operation: ContractOperation, delay: Duration) -> Self {
        Self {
            inner,
            operation,
            delay,
        }
    }
}

/// Gateway opened by `SlowConnector`.
pub struct SlowGateway {
    inner: LocalGateway,
    operation: ContractOperation,
    delay: Duration,
}

impl SlowGateway {
    async fn stall(&self, invocation: &Invocation) {
        if invocation.operation == self.operation {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl TransactionGateway for SlowGateway {
    fn context(&self) -> &IdentityContext {
        self.inner.context()
    }

    async fn submit(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.stall(&invocation).await;
        self.inner.submit(invocation).await
    }

    async fn evaluate(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.stall(&invocation).await;
        self.inner.evaluate(invocation).await
    }

    fn disconnect(&self) {
        self.inner.disconnect();
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}

#[async_trait]
impl GatewayConnector for SlowConnector {
    type Gateway = SlowGateway;

    async fn connect(&self, context: &IdentityContext) -> Result<SlowGateway, GatewayError> {
        let inner = self.inner.connect(context).await?;
        Ok(SlowGateway {
            inner,
            operation: self.operation,
            delay: self.delay,
        })
    }
}
