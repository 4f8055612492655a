//! # Transfer Orchestrator
//!
//! Drives one confidential transfer between two organizations:
//!
//! ```text
//! seller (Org1)                           buyer (Org2)
//!   │ InitLedger, GetAllAssets               │
//!   │ CreatePrivateAsset ──► read back       │
//!   │ TransferPrivateAsset ✗ (no agreement)  │
//!   │                                        │ ReadAsset (retry), read seller collection
//!   │                                        │ AgreeToTransfer ──► read own copy
//!   │ ReadTransferAgreement (retry)          │
//!   │ TransferPrivateAsset ──► read back     │ ReadAsset (retry), ReadAssetPrivateDetails
//!   │ GetAssetHistory                        │
//!   ▼ release                                ▼ release
//! ```
//!
//! Every step's result is verified before the next step starts. A failed
//! verification, an unexpected rejection or a transport error ends the run;
//! both sessions are released on every exit path, including timeout.

use crate::config::{AbsentCollectionPolicy, ProtocolConfig, RetryPolicy, SellerCopyCheck};
use crate::domain::{ForeignReadOutcome, NegativePathOutcome, RunReport, SellerCopyStatus, Step};
use crate::error::{ProtocolError, Result};
use crate::retry::read_with_retry;
use crate::session::{OrgSession, Role};
use crate::verification::{
    decode_assets, decode_exists, verify_absent, verify_agreement, verify_history,
    verify_private_details, verify_public_asset, ExpectedAsset, VerificationError,
};
use pa_01_asset_state::{
    invariant_private_matches_public, invariant_transfer_effect, AssetLifecycle, AssetPhase,
    AssetStateError, GatewayConnector, Holder,
};
use pa_telemetry::log_step;
use shared_types::{
    Asset, AssetHistoryEntry, AssetOwnerTransfer, AssetPrivateDetails, AssetProperties,
    AssetSecret, AssetValue, ContractOperation, GatewayError, IdentityContext, Invocation, MspId,
    RejectionCode, TransferAgreement, TRANSIENT_ASSET_OWNER, TRANSIENT_ASSET_PROPERTIES,
    TRANSIENT_ASSET_VALUE,
};
use std::time::Instant;
use tracing::{error, info};

/// Session type produced by connector `C`.
pub type Session<C> = OrgSession<<C as GatewayConnector>::Gateway>;

/// What `transferPrivateAsset` observed.
#[derive(Clone, Debug)]
pub struct TransferOutcome {
    /// Public record as read back by the seller
    pub transferred: Asset,
    /// Buyer's private copy
    pub buyer_details: AssetPrivateDetails,
    /// Seller's private copy
    pub seller_copy: SellerCopyStatus,
}

/// Sequences the protocol steps for one run.
pub struct TransferOrchestrator<C: GatewayConnector> {
    connector: C,
    config: ProtocolConfig,
}

impl<C: GatewayConnector> TransferOrchestrator<C> {
    /// Create an orchestrator. The configuration is validated here, before
    /// any connection is opened.
    pub fn new(connector: C, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { connector, config })
    }

    /// Run configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Connector used to open sessions.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Execute the whole protocol under the configured deadline.
    pub async fn run(&self) -> Result<RunReport> {
        let deadline = self.config.run_timeout;
        let started = Instant::now();
        info!(
            run_id = %self.config.run_id,
            asset_id = %self.config.asset_id(),
            seller = %self.config.seller.msp_id(),
            buyer = %self.config.buyer.msp_id(),
            "[pa-02] Transfer run started"
        );

        // On expiry the step future is dropped, which drops (and so
        // disconnects) both sessions.
        let result = match tokio::time::timeout(deadline, self.run_steps()).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Timeout { after: deadline }),
        };

        match &result {
            Ok(report) => info!(
                run_id = %report.run_id,
                owner = %report.transferred.owner,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "[pa-02] Transfer run complete"
            ),
            Err(e) => error!(
                run_id = %self.config.run_id,
                step = e.step().map(|s| s.as_str()).unwrap_or("run"),
                kind = e.kind(),
                field = e.field().unwrap_or(""),
                error = %e,
                "[pa-02] Transfer run failed"
            ),
        }
        result
    }

    /// Open a session for `context`.
    pub async fn open(&self, context: &IdentityContext, role: Role) -> Result<Session<C>> {
        OrgSession::open(&self.connector, context, role)
            .await
            .map_err(|e| ProtocolError::from_gateway(Step::Connect, e))
    }

    async fn run_steps(&self) -> Result<RunReport> {
        let seller = self.open(&self.config.seller, Role::Seller).await?;
        // A failed buyer connect drops (and releases) the seller session.
        let buyer = self.open(&self.config.buyer, Role::Buyer).await?;

        let result = self.drive(&seller, &buyer).await;
        seller.release();
        buyer.release();
        result
    }

    async fn drive(&self, seller: &Session<C>, buyer: &Session<C>) -> Result<RunReport> {
        let asset_id = self.config.asset_id();
        let properties = self.config.asset.properties(asset_id.as_str());
        let mut tracker = AssetLifecycle::new(asset_id.as_str());
        let mut completed = Vec::with_capacity(Step::SEQUENCE.len());

        self.initialize_ledger(seller).await?;
        completed.push(Step::InitializeLedger);

        let ledger_assets = self.list_all_assets(seller).await?;
        completed.push(Step::ListAllAssets);

        let created = self.create_private_asset(seller, &mut tracker, &properties).await?;
        completed.push(Step::CreatePrivateAsset);

        let negative_path = self
            .attempt_unauthorized_transfer(seller, &tracker, buyer.msp_id())
            .await?;
        completed.push(Step::AttemptUnauthorizedTransfer);

        let foreign_read = self
            .agree_to_transfer(buyer, &mut tracker, &properties.secret)
            .await?;
        completed.push(Step::AgreeToTransfer);

        let agreement = self.read_transfer_agreement(seller, &tracker).await?;
        completed.push(Step::ReadTransferAgreement);

        let outcome = self
            .transfer_private_asset(seller, buyer, &mut tracker, &properties.secret)
            .await?;
        completed.push(Step::TransferPrivateAsset);

        let history = self.get_asset_history(seller, &tracker).await?;
        completed.push(Step::GetAssetHistory);

        Ok(RunReport {
            run_id: self.config.run_id.clone(),
            asset_id,
            seller: seller.msp_id().clone(),
            buyer: buyer.msp_id().clone(),
            ledger_assets,
            created,
            negative_path,
            foreign_read,
            agreement,
            transferred: outcome.transferred,
            buyer_details: outcome.buyer_details,
            seller_copy: outcome.seller_copy,
            history,
            completed,
        })
    }

    // =========================================================================
    // STEPS
    // =========================================================================

    /// Step 1: seed the ledger.
    pub async fn initialize_ledger(&self, org: &Session<C>) -> Result<()> {
        let step = Step::InitializeLedger;
        submit(org, step, Invocation::new(ContractOperation::InitLedger)).await?;
        log_step!(info, step, org = %org.msp_id(), outcome = "ok", "[pa-02] Ledger initialized");
        Ok(())
    }

    /// Step 2: read every public asset. Any well-formed list, including an
    /// empty one, is accepted.
    pub async fn list_all_assets(&self, org: &Session<C>) -> Result<Vec<Asset>> {
        let step = Step::ListAllAssets;
        let payload = evaluate(org, step, Invocation::new(ContractOperation::GetAllAssets)).await?;
        let assets =
            decode_assets(&payload).map_err(|e| ProtocolError::from_verification(step, e))?;
        log_step!(
            info,
            step,
            org = %org.msp_id(),
            count = assets.len(),
            outcome = "ok",
            "[pa-02] Assets listed"
        );
        Ok(assets)
    }

    /// Step 3: create the private asset, then read it back through the
    /// creating organization: public record, existence flag and the private
    /// copy in its own collection.
    pub async fn create_private_asset(
        &self,
        org: &Session<C>,
        tracker: &mut AssetLifecycle,
        properties: &AssetProperties,
    ) -> Result<Asset> {
        let step = Step::CreatePrivateAsset;
        let asset_id = properties.asset_id.as_str();

        let payload =
            evaluate(org, step, read_invocation(ContractOperation::AssetExists, asset_id)).await?;
        if decode_exists(&payload).map_err(|e| ProtocolError::from_verification(step, e))? {
            return Err(ProtocolError::State {
                step,
                source: AssetStateError::AssetAlreadyExists(asset_id.to_string()),
            });
        }

        tracker
            .submit_create(Holder::new(org.msp_id().clone(), org.user_id()))
            .map_err(|source| ProtocolError::State { step, source })?;
        let invocation = Invocation::new(ContractOperation::CreatePrivateAsset)
            .transient(TRANSIENT_ASSET_PROPERTIES, properties)
            .map_err(|e| encoding(step, e))?;
        submit(org, step, invocation).await?;
        tracker
            .confirm_commit()
            .map_err(|source| ProtocolError::State { step, source })?;

        let expected = ExpectedAsset {
            asset_id,
            color: &properties.color,
            size: properties.size,
            owner_contains: org.user_id(),
            appraised_value: Some(properties.appraised_value),
        };
        let asset = read_public(org, step, &expected).await?;

        let payload = evaluate(org, step, read_invocation(ContractOperation::AssetExists, asset_id)).await?;
        let exists = decode_exists(&payload).map_err(|e| ProtocolError::from_verification(step, e))?;
        if !exists {
            return Err(ProtocolError::Verification {
                step,
                source: VerificationError::FieldMismatch {
                    record: "existence flag",
                    field: "exists",
                    expected: "true".into(),
                    actual: "false".into(),
                },
            });
        }

        let details = read_private(
            org,
            step,
            &org.private_collection(),
            asset_id,
            Some(&properties.secret),
        )
        .await?;
        invariant_private_matches_public(&asset, &details)
            .map_err(|source| ProtocolError::State { step, source })?;

        log_step!(
            info,
            step,
            org = %org.msp_id(),
            asset_id,
            owner = %asset.owner,
            outcome = "ok",
            "[pa-02] Private asset created"
        );
        Ok(asset)
    }

    /// Step 4: attempt the transfer before any agreement exists. The
    /// contract must reject it for the missing agreement; committing is
    /// fatal. A contract rejection for another reason is recorded as an
    /// unexpected rejection, a transport failure as degraded, and the run
    /// goes on. Either way the owner must still be the seller afterwards.
    pub async fn attempt_unauthorized_transfer(
        &self,
        seller: &Session<C>,
        tracker: &AssetLifecycle,
        buyer_msp: &MspId,
    ) -> Result<NegativePathOutcome> {
        let step = Step::AttemptUnauthorizedTransfer;
        let asset_id = tracker.asset_id.as_str();
        if tracker.phase != AssetPhase::PrivateOwned {
            return Err(ProtocolError::State {
                step,
                source: AssetStateError::InvalidTransition {
                    from: tracker.phase.to_string(),
                    to: AssetPhase::PrivateOwned.to_string(),
                },
            });
        }

        let request = AssetOwnerTransfer {
            asset_id: asset_id.to_string(),
            buyer_msp: buyer_msp.to_string(),
        };
        let invocation = Invocation::new(ContractOperation::TransferPrivateAsset)
            .transient(TRANSIENT_ASSET_OWNER, &request)
            .map_err(|e| encoding(step, e))?;

        let outcome = match seller.submit(invocation).await {
            Ok(_) => {
                return Err(ProtocolError::UnexpectedSuccess {
                    step,
                    operation: ContractOperation::TransferPrivateAsset.to_string(),
                });
            }
            Err(GatewayError::ContractRejected {
                code: RejectionCode::AgreementMissing,
                message,
                ..
            }) => {
                log_step!(
                    info,
                    step,
                    org = %seller.msp_id(),
                    asset_id,
                    outcome = "rejected",
                    reason = %message,
                    "[pa-02] Transfer without agreement rejected as expected"
                );
                NegativePathOutcome::Rejected { message }
            }
            Err(GatewayError::ContractRejected { code, message, .. }) => {
                log_step!(
                    warn,
                    step,
                    org = %seller.msp_id(),
                    asset_id,
                    outcome = "unexpected_rejection",
                    code = %code,
                    reason = %message,
                    "[pa-02] Transfer without agreement rejected for another reason"
                );
                NegativePathOutcome::UnexpectedRejection { code, message }
            }
            Err(other) => {
                log_step!(
                    warn,
                    step,
                    org = %seller.msp_id(),
                    asset_id,
                    outcome = "degraded",
                    error = %other,
                    "[pa-02] Transfer without agreement failed for a non-contract reason"
                );
                NegativePathOutcome::Degraded {
                    error: other.to_string(),
                }
            }
        };

        let expected = self.expected_asset(asset_id, seller.user_id());
        read_public(seller, step, &expected).await?;
        Ok(outcome)
    }

    /// Step 5: the buyer checks the public record, reads the seller's
    /// collection, then agrees to buy by restating the secret. The buyer's
    /// own copy is read back afterwards.
    pub async fn agree_to_transfer(
        &self,
        buyer: &Session<C>,
        tracker: &mut AssetLifecycle,
        secret: &AssetSecret,
    ) -> Result<ForeignReadOutcome> {
        let step = Step::AgreeToTransfer;
        let asset_id = tracker.asset_id.clone();
        let owner = tracker.owner.clone().ok_or_else(|| ProtocolError::State {
            step,
            source: AssetStateError::AssetNotFound(asset_id.clone()),
        })?;

        let expected = self.expected_asset(&asset_id, &owner.user_id);
        let expected = &expected;
        let policy = read_policy(&self.config, buyer.msp_id(), &owner.msp_id);
        read_with_retry(policy, step, move || async move {
            read_public(buyer, step, expected).await
        })
        .await?;

        let foreign_read = self
            .read_foreign_collection(buyer, step, &owner.msp_id.private_collection(), &asset_id)
            .await?;

        tracker
            .record_agreement(Holder::new(buyer.msp_id().clone(), buyer.user_id()))
            .map_err(|source| ProtocolError::State { step, source })?;
        let value = AssetValue {
            asset_id: asset_id.clone(),
            secret: secret.clone(),
        };
        let invocation = Invocation::new(ContractOperation::AgreeToTransfer)
            .transient(TRANSIENT_ASSET_VALUE, &value)
            .map_err(|e| encoding(step, e))?;
        submit(buyer, step, invocation).await?;

        read_private(buyer, step, &buyer.private_collection(), &asset_id, Some(secret)).await?;

        log_step!(
            info,
            step,
            org = %buyer.msp_id(),
            asset_id = %asset_id,
            foreign_read = ?foreign_read,
            outcome = "ok",
            "[pa-02] Agreement recorded"
        );
        Ok(foreign_read)
    }

    /// Step 6: read the agreement recorded by the tracked buyer. Retried
    /// when the agreement was committed through another organization.
    pub async fn read_transfer_agreement(
        &self,
        org: &Session<C>,
        tracker: &AssetLifecycle,
    ) -> Result<TransferAgreement> {
        let step = Step::ReadTransferAgreement;
        let asset_id = tracker.asset_id.as_str();
        let buyer = tracker.buyer.as_ref().ok_or_else(|| ProtocolError::State {
            step,
            source: AssetStateError::AgreementMissing {
                asset_id: asset_id.to_string(),
                collection: "any buyer collection".to_string(),
            },
        })?;
        let buyer_user = buyer.user_id.as_str();

        let policy = read_policy(&self.config, org.msp_id(), &buyer.msp_id);
        let agreement = read_with_retry(policy, step, move || async move {
            let payload = evaluate(
                org,
                step,
                read_invocation(ContractOperation::ReadTransferAgreement, asset_id),
            )
            .await?;
            verify_agreement(&payload, asset_id, buyer_user)
                .map_err(|e| ProtocolError::from_verification(step, e))
        })
        .await?;

        log_step!(
            info,
            step,
            org = %org.msp_id(),
            asset_id,
            buyer_id = %agreement.buyer_id,
            outcome = "ok",
            "[pa-02] Agreement read"
        );
        Ok(agreement)
    }

    /// Step 7: transfer to the buyer, then check the effect from both sides:
    /// new owner on the public record, the buyer's private copy, and the
    /// seller's copy gone.
    pub async fn transfer_private_asset(
        &self,
        seller: &Session<C>,
        buyer: &Session<C>,
        tracker: &mut AssetLifecycle,
        secret: &AssetSecret,
    ) -> Result<TransferOutcome> {
        let step = Step::TransferPrivateAsset;
        let asset_id = tracker.asset_id.clone();

        let mut next = tracker.clone();
        next.complete_transfer(buyer.msp_id())
            .map_err(|source| ProtocolError::State { step, source })?;

        let request = AssetOwnerTransfer {
            asset_id: asset_id.clone(),
            buyer_msp: buyer.msp_id().to_string(),
        };
        let invocation = Invocation::new(ContractOperation::TransferPrivateAsset)
            .transient(TRANSIENT_ASSET_OWNER, &request)
            .map_err(|e| encoding(step, e))?;
        submit(seller, step, invocation).await?;
        *tracker = next;

        let expected = self.expected_asset(&asset_id, buyer.user_id());
        let transferred = read_public(seller, step, &expected).await?;

        let expected = &expected;
        let policy = read_policy(&self.config, buyer.msp_id(), seller.msp_id());
        read_with_retry(policy, step, move || async move {
            read_public(buyer, step, expected).await
        })
        .await?;
        let buyer_details =
            read_private(buyer, step, &buyer.private_collection(), &asset_id, Some(secret)).await?;
        invariant_transfer_effect(&transferred, buyer.user_id(), Some(&buyer_details), secret)
            .map_err(|source| ProtocolError::State { step, source })?;

        let seller_copy = match self.config.seller_copy_check {
            SellerCopyCheck::Skip => SellerCopyStatus::NotChecked,
            SellerCopyCheck::ExpectAbsent => {
                let collection = seller.private_collection();
                let payload = evaluate(
                    seller,
                    step,
                    private_invocation(&collection, &asset_id),
                )
                .await?;
                verify_absent(&payload, &collection)
                    .map_err(|e| ProtocolError::from_verification(step, e))?;
                SellerCopyStatus::Absent
            }
        };

        log_step!(
            info,
            step,
            org = %seller.msp_id(),
            asset_id = %asset_id,
            owner = %transferred.owner,
            seller_copy = ?seller_copy,
            outcome = "ok",
            "[pa-02] Asset transferred"
        );
        Ok(TransferOutcome {
            transferred,
            buyer_details,
            seller_copy,
        })
    }

    /// Step 8: read the asset's history; the latest version must name the
    /// tracked owner.
    pub async fn get_asset_history(
        &self,
        org: &Session<C>,
        tracker: &AssetLifecycle,
    ) -> Result<Vec<AssetHistoryEntry>> {
        let step = Step::GetAssetHistory;
        let asset_id = tracker.asset_id.as_str();
        let owner = tracker.owner.as_ref().ok_or_else(|| ProtocolError::State {
            step,
            source: AssetStateError::AssetNotFound(asset_id.to_string()),
        })?;
        let owner_user = owner.user_id.as_str();

        // Every version is committed by the seller
        let policy = read_policy(&self.config, org.msp_id(), self.config.seller.msp_id());
        let history = read_with_retry(policy, step, move || async move {
            let payload = evaluate(
                org,
                step,
                read_invocation(ContractOperation::GetAssetHistory, asset_id),
            )
            .await?;
            verify_history(&payload, asset_id, owner_user)
                .map_err(|e| ProtocolError::from_verification(step, e))
        })
        .await?;

        log_step!(
            info,
            step,
            org = %org.msp_id(),
            asset_id,
            versions = history.len(),
            outcome = "ok",
            "[pa-02] History read"
        );
        Ok(history)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn expected_asset<'a>(&'a self, asset_id: &'a str, owner: &'a str) -> ExpectedAsset<'a> {
        ExpectedAsset {
            asset_id,
            color: &self.config.asset.color,
            size: self.config.asset.size,
            owner_contains: owner,
            appraised_value: None,
        }
    }

    /// Read a collection `org` never owned. Data coming back is a
    /// confidentiality breach; an empty result always counts as absent, a
    /// denial only when the policy allows it.
    async fn read_foreign_collection(
        &self,
        org: &Session<C>,
        step: Step,
        collection: &str,
        asset_id: &str,
    ) -> Result<ForeignReadOutcome> {
        match org.evaluate(private_invocation(collection, asset_id)).await {
            Ok(payload) => {
                verify_absent(&payload, collection)
                    .map_err(|e| ProtocolError::from_verification(step, e))?;
                info!(
                    %step,
                    org = %org.msp_id(),
                    collection,
                    "[pa-02] Foreign collection read returned no data"
                );
                Ok(ForeignReadOutcome::Empty)
            }
            Err(GatewayError::ContractRejected {
                code: RejectionCode::Unauthorized,
                message,
                ..
            }) if self.config.absent_collection == AbsentCollectionPolicy::EmptyOrDenied =>
            {
                info!(
                    %step,
                    org = %org.msp_id(),
                    collection,
                    reason = %message,
                    "[pa-02] Foreign collection read denied"
                );
                Ok(ForeignReadOutcome::Denied)
            }
            Err(e) => Err(ProtocolError::from_gateway(step, e)),
        }
    }
}

impl<C: GatewayConnector + std::fmt::Debug> std::fmt::Debug for TransferOrchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("connector", &self.connector)
            .field("run_id", &self.config.run_id)
            .finish()
    }
}

fn read_invocation(operation: ContractOperation, asset_id: &str) -> Invocation {
    Invocation::new(operation).arg(asset_id)
}

fn private_invocation(collection: &str, asset_id: &str) -> Invocation {
    Invocation::new(ContractOperation::ReadAssetPrivateDetails)
        .arg(collection)
        .arg(asset_id)
}

fn encoding(step: Step, error: serde_json::Error) -> ProtocolError {
    ProtocolError::Encoding {
        step,
        reason: error.to_string(),
    }
}

async fn submit<G>(org: &OrgSession<G>, step: Step, invocation: Invocation) -> Result<Vec<u8>>
where
    G: pa_01_asset_state::TransactionGateway,
{
    org.submit(invocation)
        .await
        .map_err(|e| ProtocolError::from_gateway(step, e))
}

async fn evaluate<G>(org: &OrgSession<G>, step: Step, invocation: Invocation) -> Result<Vec<u8>>
where
    G: pa_01_asset_state::TransactionGateway,
{
    org.evaluate(invocation)
        .await
        .map_err(|e| ProtocolError::from_gateway(step, e))
}

async fn read_public<G>(
    org: &OrgSession<G>,
    step: Step,
    expected: &ExpectedAsset<'_>,
) -> Result<Asset>
where
    G: pa_01_asset_state::TransactionGateway,
{
    let payload = evaluate(
        org,
        step,
        read_invocation(ContractOperation::ReadAsset, expected.asset_id),
    )
    .await?;
    verify_public_asset(&payload, expected).map_err(|e| ProtocolError::from_verification(step, e))
}

async fn read_private<G>(
    org: &OrgSession<G>,
    step: Step,
    collection: &str,
    asset_id: &str,
    secret: Option<&AssetSecret>,
) -> Result<AssetPrivateDetails>
where
    G: pa_01_asset_state::TransactionGateway,
{
    let payload = evaluate(org, step, private_invocation(collection, asset_id)).await?;
    verify_private_details(&payload, asset_id, secret)
        .map_err(|e| ProtocolError::from_verification(step, e))
}

/// Same-organization reads see their own commits; only reads of data
/// committed elsewhere need the configured retry.
pub fn read_policy(config: &ProtocolConfig, reader: &MspId, writer: &MspId) -> RetryPolicy {
    if reader == writer {
        RetryPolicy::once()
    } else {
        config.read_retry
    }
}
