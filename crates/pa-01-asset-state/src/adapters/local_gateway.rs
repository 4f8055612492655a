//! Local Gateway Adapter
//!
//! Implements `GatewayConnector` / `TransactionGateway` in-process against a
//! `ContractRouter`. Each call suspends once before reaching the contract, so
//! callers exercise the same await points as with a networked gateway.
//!
//! `FaultPlan` injects transport failures ahead of the contract for tests.

use super::contract_router::ContractRouter;
use crate::ports::inbound::{AssetContractApi, CallerContext};
use crate::ports::outbound::{GatewayConnector, TransactionGateway};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    ContractOperation, GatewayError, IdentityContext, Invocation, MspId, DEFAULT_CHANNEL,
    DEFAULT_CONTRACT,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
struct InjectedFault {
    msp: Option<MspId>,
    operation: ContractOperation,
    error: GatewayError,
}

/// Scripted transport failures.
///
/// A fault fires once, on the first call matching its organization (or any
/// organization when `None`) and operation, and the call never reaches the
/// contract.
#[derive(Debug, Default)]
pub struct FaultPlan {
    faults: Mutex<VecDeque<InjectedFault>>,
    refused: Mutex<HashSet<MspId>>,
}

impl FaultPlan {
    /// Empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next matching call with `error`.
    pub fn fail_next(&self, msp: Option<MspId>, operation: ContractOperation, error: GatewayError) {
        self.faults.lock().push_back(InjectedFault {
            msp,
            operation,
            error,
        });
    }

    /// Refuse every connection attempt for `msp`.
    pub fn refuse_connections(&self, msp: MspId) {
        self.refused.lock().insert(msp);
    }

    /// Faults not fired yet.
    pub fn pending(&self) -> usize {
        self.faults.lock().len()
    }

    fn take(&self, msp: &MspId, operation: ContractOperation) -> Option<GatewayError> {
        let mut faults = self.faults.lock();
        let index = faults.iter().position(|f| {
            f.operation == operation && f.msp.as_ref().map_or(true, |m| m == msp)
        })?;
        faults.remove(index).map(|f| f.error)
    }

    fn refuses(&self, msp: &MspId) -> bool {
        self.refused.lock().contains(msp)
    }
}

/// Opens in-process gateways onto one contract.
#[derive(Clone, Debug)]
pub struct LocalConnector {
    router: ContractRouter,
    channel: String,
    contract: String,
    faults: Arc<FaultPlan>,
    open: Arc<AtomicUsize>,
}

impl LocalConnector {
    /// Serve `contract` as `mychannel` / `private`.
    pub fn new(contract: Arc<dyn AssetContractApi>) -> Self {
        Self {
            router: ContractRouter::new(contract),
            channel: DEFAULT_CHANNEL.to_string(),
            contract: DEFAULT_CONTRACT.to_string(),
            faults: Arc::new(FaultPlan::new()),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Use a shared fault plan.
    pub fn with_faults(mut self, faults: Arc<FaultPlan>) -> Self {
        self.faults = faults;
        self
    }

    /// Fault plan consulted on every call.
    pub fn faults(&self) -> &Arc<FaultPlan> {
        &self.faults
    }

    /// Gateways opened and not yet disconnected.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayConnector for LocalConnector {
    type Gateway = LocalGateway;

    async fn connect(&self, context: &IdentityContext) -> Result<LocalGateway, GatewayError> {
        tokio::task::yield_now().await;

        let org = context.msp_id().to_string();
        if self.faults.refuses(context.msp_id()) {
            return Err(GatewayError::Unavailable {
                org,
                reason: "connection refused".to_string(),
            });
        }
        if context.channel != self.channel || context.contract != self.contract {
            return Err(GatewayError::Unavailable {
                org,
                reason: format!(
                    "contract {} not found on channel {}",
                    context.contract, context.channel
                ),
            });
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        info!(
            "[pa-01] Gateway connected for {} as {}",
            context.msp_id(),
            context.user_id()
        );
        Ok(LocalGateway {
            caller: CallerContext::from_identity(&context.identity),
            context: context.clone(),
            router: self.router.clone(),
            faults: Arc::clone(&self.faults),
            open: Arc::clone(&self.open),
            connected: AtomicBool::new(true),
        })
    }
}

/// In-process gateway bound to one identity.
#[derive(Debug)]
pub struct LocalGateway {
    context: IdentityContext,
    caller: CallerContext,
    router: ContractRouter,
    faults: Arc<FaultPlan>,
    open: Arc<AtomicUsize>,
    connected: AtomicBool,
}

impl LocalGateway {
    async fn call(&self, invocation: Invocation, submit: bool) -> Result<Vec<u8>, GatewayError> {
        tokio::task::yield_now().await;

        if !self.is_connected() {
            return Err(GatewayError::Closed {
                org: self.context.msp_id().to_string(),
            });
        }
        if let Some(error) = self.faults.take(self.context.msp_id(), invocation.operation) {
            warn!(
                "[pa-01] Injected fault on {} for {}: {}",
                invocation.operation,
                self.context.msp_id(),
                error
            );
            return Err(error);
        }

        debug!(
            "[pa-01] {} {} as {}",
            if submit { "Submit" } else { "Evaluate" },
            invocation.operation,
            self.context.msp_id()
        );
        self.router.route(&self.caller, &invocation, submit)
    }
}

#[async_trait]
impl TransactionGateway for LocalGateway {
    fn context(&self) -> &IdentityContext {
        &self.context
    }

    async fn submit(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.call(invocation, true).await
    }

    async fn evaluate(&self, invocation: Invocation) -> Result<Vec<u8>, GatewayError> {
        self.call(invocation, false).await
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.open.fetch_sub(1, Ordering::SeqCst);
            info!("[pa-01] Gateway disconnected for {}", self.context.msp_id());
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
