//! Contract Router
//!
//! Maps a named `Invocation` onto the `AssetContractApi` and encodes the
//! result the way the contract returns it over the wire: JSON for records,
//! `true`/`false` for existence checks, an empty payload for absent records
//! and for committed writes.

use crate::domain::AssetStateError;
use crate::ports::inbound::{AssetContractApi, CallerContext};
use serde::Serialize;
use shared_types::{ContractOperation, GatewayError, Invocation};
use std::sync::Arc;

/// Dispatches invocations to a contract implementation.
#[derive(Clone)]
pub struct ContractRouter {
    contract: Arc<dyn AssetContractApi>,
}

impl ContractRouter {
    /// Route invocations to `contract`.
    pub fn new(contract: Arc<dyn AssetContractApi>) -> Self {
        Self { contract }
    }

    /// Run `invocation` for `caller`. `submit` is false for evaluate calls,
    /// which may not run ledger-writing operations.
    ///
    /// Every contract error comes back as `GatewayError::ContractRejected`.
    pub fn route(
        &self,
        caller: &CallerContext,
        invocation: &Invocation,
        submit: bool,
    ) -> Result<Vec<u8>, GatewayError> {
        self.dispatch(caller, invocation, submit)
            .map_err(|e| GatewayError::ContractRejected {
                operation: invocation.operation.to_string(),
                code: e.rejection_code(),
                message: e.to_string(),
            })
    }

    fn dispatch(
        &self,
        caller: &CallerContext,
        invocation: &Invocation,
        submit: bool,
    ) -> Result<Vec<u8>, AssetStateError> {
        let op = invocation.operation;
        if op.is_submit() && !submit {
            return Err(AssetStateError::SubmitRequired(op.to_string()));
        }
        let args = &invocation.args;
        let transient = &invocation.transient;

        match op {
            ContractOperation::InitLedger => {
                expect_args(op, args, 0)?;
                self.contract.init_ledger(caller)?;
                Ok(Vec::new())
            }
            ContractOperation::GetAllAssets => {
                expect_args(op, args, 0)?;
                encode(&self.contract.get_all_assets(caller)?)
            }
            ContractOperation::CreatePrivateAsset => {
                expect_args(op, args, 0)?;
                self.contract.create_private_asset(caller, transient)?;
                Ok(Vec::new())
            }
            ContractOperation::ReadAsset => {
                expect_args(op, args, 1)?;
                encode_optional(self.contract.read_asset(caller, &args[0])?)
            }
            ContractOperation::AssetExists => {
                expect_args(op, args, 1)?;
                encode(&self.contract.asset_exists(caller, &args[0])?)
            }
            ContractOperation::ReadAssetPrivateDetails => {
                expect_args(op, args, 2)?;
                encode_optional(
                    self.contract
                        .read_asset_private_details(caller, &args[0], &args[1])?,
                )
            }
            ContractOperation::AgreeToTransfer => {
                expect_args(op, args, 0)?;
                self.contract.agree_to_transfer(caller, transient)?;
                Ok(Vec::new())
            }
            ContractOperation::ReadTransferAgreement => {
                expect_args(op, args, 1)?;
                encode_optional(self.contract.read_transfer_agreement(caller, &args[0])?)
            }
            ContractOperation::TransferPrivateAsset => {
                expect_args(op, args, 0)?;
                self.contract.transfer_private_asset(caller, transient)?;
                Ok(Vec::new())
            }
            ContractOperation::GetAssetHistory => {
                expect_args(op, args, 1)?;
                encode(&self.contract.get_asset_history(caller, &args[0])?)
            }
        }
    }
}

impl std::fmt::Debug for ContractRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRouter").finish_non_exhaustive()
    }
}

fn expect_args(
    op: ContractOperation,
    args: &[String],
    expected: usize,
) -> Result<(), AssetStateError> {
    if args.len() != expected {
        return Err(AssetStateError::InvalidArguments {
            operation: op.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, AssetStateError> {
    Ok(serde_json::to_vec(value)?)
}

fn encode_optional<T: Serialize>(value: Option<T>) -> Result<Vec<u8>, AssetStateError> {
    match value {
        Some(v) => encode(&v),
        None => Ok(Vec::new()),
    }
}
