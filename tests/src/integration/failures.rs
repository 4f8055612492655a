//! # Fatal Paths
//!
//! Every failure outside the negative path ends the run, names the step,
//! and leaves no session open.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        fast_config, faulty_orchestrator, ledger, orchestrator, properties, ContractDouble,
        Misbehavior, SlowConnector,
    };
    use pa_01_asset_state::{AssetLifecycle, AssetPhase, FaultPlan, LocalConnector};
    use pa_02_transfer_protocol::{
        ConfigError, NegativePathOutcome, ProtocolConfig, ProtocolError, Role, Step,
        TransferOrchestrator, VerificationError,
    };
    use shared_types::{AssetSecret, ContractOperation, GatewayError, MspId, RejectionCode, UserRole};
    use std::sync::Arc;
    use std::time::Duration;

    fn org1() -> Option<MspId> {
        Some(MspId::new("Org1MSP"))
    }

    fn org2() -> Option<MspId> {
        Some(MspId::new("Org2MSP"))
    }

    // =========================================================================
    // NEGATIVE PATH
    // =========================================================================

    #[tokio::test]
    async fn test_committed_negative_path_is_fatal() {
        let double = ContractDouble::new(Misbehavior::AcceptFirstTransfer);
        let (orchestrator, connector) = orchestrator(double.clone(), fast_config("61"));

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, ProtocolError::UnexpectedSuccess { .. }));
        assert_eq!(err.step(), Some(Step::AttemptUnauthorizedTransfer));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_degraded_negative_path_keeps_owner() {
        let faults = Arc::new(FaultPlan::new());
        faults.fail_next(
            org1(),
            ContractOperation::TransferPrivateAsset,
            GatewayError::EndorsementFailed {
                operation: "TransferPrivateAsset".into(),
                reason: "peer0.org1 unreachable".into(),
            },
        );
        let (orchestrator, _connector) = faulty_orchestrator(ledger(), fast_config("62"), faults.clone());

        let report = orchestrator.run().await.unwrap();

        assert!(matches!(
            report.negative_path,
            NegativePathOutcome::Degraded { ref error } if error.contains("Endorsement failed")
        ));
        assert!(report.created.owner.contains("Farmer62"));
        assert!(report.transferred.owner.contains("Retailer62"));
        assert_eq!(faults.pending(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_secret_blocks_transfer() {
        let ledger = ledger();
        let config = fast_config("63");
        let (orchestrator, _connector) = orchestrator(ledger.clone(), config.clone());
        let seller = orchestrator.open(&config.seller, Role::Seller).await.unwrap();
        let buyer = orchestrator.open(&config.buyer, Role::Buyer).await.unwrap();

        let props = properties(&config);
        let mut tracker = AssetLifecycle::new(props.asset_id.as_str());
        orchestrator
            .create_private_asset(&seller, &mut tracker, &props)
            .await
            .unwrap();
        orchestrator
            .agree_to_transfer(&buyer, &mut tracker, &AssetSecret::new(9999))
            .await
            .unwrap();

        let err = orchestrator
            .transfer_private_asset(&seller, &buyer, &mut tracker, &props.secret)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation_rejection");
        assert_eq!(err.step(), Some(Step::TransferPrivateAsset));
        assert_eq!(tracker.phase, AssetPhase::TransferAgreed);
        let lifecycle = ledger.lifecycle("asset63").unwrap();
        assert_eq!(lifecycle.owner_msp(), Some(&MspId::new("Org1MSP")));
    }

    #[tokio::test]
    async fn test_transfer_to_own_organization_is_unexpected_rejection() {
        let ledger = ledger();
        let config = fast_config("68");
        let (orchestrator, _connector) = orchestrator(ledger.clone(), config.clone());
        let seller = orchestrator.open(&config.seller, Role::Seller).await.unwrap();

        let props = properties(&config);
        let mut tracker = AssetLifecycle::new(props.asset_id.as_str());
        orchestrator
            .create_private_asset(&seller, &mut tracker, &props)
            .await
            .unwrap();
        let outcome = orchestrator
            .attempt_unauthorized_transfer(&seller, &tracker, seller.msp_id())
            .await
            .unwrap();
        seller.release();

        assert!(!outcome.is_rejected());
        assert!(matches!(
            outcome,
            NegativePathOutcome::UnexpectedRejection { code: RejectionCode::Unauthorized, ref message }
                if message.contains("current owner organization")
        ));
        assert_eq!(outcome.label(), "unexpected_rejection");
        let lifecycle = ledger.lifecycle("asset68").unwrap();
        assert_eq!(lifecycle.owner_msp(), Some(&MspId::new("Org1MSP")));
    }

    // =========================================================================
    // IDENTITY AND CONFIGURATION
    // =========================================================================

    #[tokio::test]
    async fn test_retailer_seller_cannot_create() {
        let ledger = ledger();
        let mut config = fast_config("69");
        config.seller.identity.role = Some(UserRole::Retailer);
        let (orchestrator, connector) = orchestrator(ledger.clone(), config);

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.kind(), "validation_rejection");
        assert_eq!(err.step(), Some(Step::CreatePrivateAsset));
        assert!(err.to_string().contains("client is a Retailer"));
        assert!(ledger.lifecycle("asset69").is_none());
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_seller_without_role_cannot_create() {
        let mut config = fast_config("70");
        config.seller.identity.role = None;
        let (orchestrator, _connector) = orchestrator(ledger(), config);

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.step(), Some(Step::CreatePrivateAsset));
        assert!(err.to_string().contains("client is not a Farmer"));
    }

    #[tokio::test]
    async fn test_base_asset_run_id_rejected_before_connect() {
        let connector = LocalConnector::new(ledger());

        let result = TransferOrchestrator::new(connector.clone(), ProtocolConfig::for_run("3"));

        assert!(matches!(
            result,
            Err(ProtocolError::Config(ConfigError::ReservedAssetId(ref id))) if id == "asset3"
        ));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_rerun_with_same_id_stops_before_create() {
        let ledger = ledger();
        let (first, _) = orchestrator(ledger.clone(), fast_config("79"));
        first.run().await.unwrap();
        let height = ledger.height();

        let (second, connector) = orchestrator(ledger.clone(), fast_config("79"));
        let err = second.run().await.unwrap_err();

        assert_eq!(err.kind(), "state");
        assert_eq!(err.step(), Some(Step::CreatePrivateAsset));
        assert!(err.to_string().contains("already exists"));
        // Only the second InitLedger was committed
        assert_eq!(ledger.height(), height + 1);
        assert_eq!(connector.open_connections(), 0);
    }

    // =========================================================================
    // TRANSPORT AND VERIFICATION FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_transport_failure_releases_both_sessions() {
        let ledger = ledger();
        let faults = Arc::new(FaultPlan::new());
        faults.fail_next(
            org2(),
            ContractOperation::AgreeToTransfer,
            GatewayError::CommitFailed {
                tx_id: "tx-agree".into(),
                status: "MVCC_READ_CONFLICT".into(),
            },
        );
        let (orchestrator, connector) = faulty_orchestrator(ledger.clone(), fast_config("64"), faults);

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.kind(), "transport");
        assert_eq!(err.step(), Some(Step::AgreeToTransfer));
        assert_eq!(connector.open_connections(), 0);
        // Committed progress stays on the ledger
        let lifecycle = ledger.lifecycle("asset64").unwrap();
        assert_eq!(lifecycle.phase, AssetPhase::PrivateOwned);
    }

    #[tokio::test]
    async fn test_refused_connection_releases_seller() {
        let faults = Arc::new(FaultPlan::new());
        faults.refuse_connections(MspId::new("Org2MSP"));
        let (orchestrator, connector) = faulty_orchestrator(ledger(), fast_config("65"), faults);

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.step(), Some(Step::Connect));
        assert_eq!(err.kind(), "transport");
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_leaked_collection_is_fatal() {
        let double = ContractDouble::new(Misbehavior::LeakForeignCollections);
        let (orchestrator, connector) = orchestrator(double.clone(), fast_config("66"));

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.step(), Some(Step::AgreeToTransfer));
        assert!(matches!(
            err,
            ProtocolError::Verification {
                source: VerificationError::UnexpectedRecord { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("Org1MSPPrivateCollection"));
        assert_eq!(connector.open_connections(), 0);
        // The agreement was never submitted
        let lifecycle = double.ledger().lifecycle("asset66").unwrap();
        assert_eq!(lifecycle.phase, AssetPhase::PrivateOwned);
    }

    // =========================================================================
    // TIMEOUT
    // =========================================================================

    #[tokio::test]
    async fn test_timeout_releases_sessions() {
        let local = LocalConnector::new(ledger());
        let slow = SlowConnector::new(
            local.clone(),
            ContractOperation::GetAssetHistory,
            Duration::from_secs(5),
        );
        let mut config = fast_config("67");
        config.run_timeout = Duration::from_millis(200);
        let orchestrator = TransferOrchestrator::new(slow, config).unwrap();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, ProtocolError::Timeout { after } if after == Duration::from_millis(200)));
        assert_eq!(err.step(), None);
        assert_eq!(local.open_connections(), 0);
    }
}
