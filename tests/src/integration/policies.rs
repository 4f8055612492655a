//! # Ledger Behavior Policies
//!
//! Cross-organization visibility lag, foreign-collection reads and the
//! seller's copy after transfer, each under both settings.

#[cfg(test)]
mod tests {
    use crate::fixtures::{fast_config, ledger_with, orchestrator, ContractDouble, Misbehavior};
    use pa_01_asset_state::{ForeignCollectionPolicy, LedgerConfig};
    use pa_02_transfer_protocol::{
        AbsentCollectionPolicy, ForeignReadOutcome, ProtocolError, RetryPolicy, SellerCopyCheck,
        SellerCopyStatus, Step, VerificationError,
    };
    use std::time::Duration;

    fn lagging(gossip_lag: u64) -> LedgerConfig {
        LedgerConfig {
            gossip_lag,
            ..LedgerConfig::default()
        }
    }

    fn denying() -> LedgerConfig {
        LedgerConfig {
            foreign_collection_policy: ForeignCollectionPolicy::Deny,
            ..LedgerConfig::default()
        }
    }

    // =========================================================================
    // GOSSIP LAG
    // =========================================================================

    #[tokio::test]
    async fn test_lagging_reads_converge() {
        let (orchestrator, connector) = orchestrator(ledger_with(lagging(3)), fast_config("71"));

        let report = orchestrator.run().await.unwrap();

        assert!(report.is_complete());
        assert!(report.agreement.buyer_id.contains("Retailer71"));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_lagging_reads_exhaust_retry() {
        let mut config = fast_config("72");
        config.read_retry = RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        };
        let (orchestrator, connector) = orchestrator(ledger_with(lagging(100)), config);

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, ProtocolError::EmptyResult { record: "asset", .. }));
        assert_eq!(err.step(), Some(Step::AgreeToTransfer));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_single_attempt_fails_on_lag() {
        let mut config = fast_config("73");
        config.read_retry = RetryPolicy::once();
        let (orchestrator, _connector) = orchestrator(ledger_with(lagging(100)), config);

        let err = orchestrator.run().await.unwrap_err();
        assert!(err.is_stale_read());
    }

    // =========================================================================
    // FOREIGN COLLECTION READS
    // =========================================================================

    #[tokio::test]
    async fn test_denied_foreign_read_counts_as_absent() {
        let (orchestrator, _connector) = orchestrator(ledger_with(denying()), fast_config("74"));

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.foreign_read, ForeignReadOutcome::Denied);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_denied_foreign_read_fatal_when_strict() {
        let mut config = fast_config("75");
        config.absent_collection = AbsentCollectionPolicy::EmptyOnly;
        let (orchestrator, connector) = orchestrator(ledger_with(denying()), config);

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.kind(), "validation_rejection");
        assert_eq!(err.step(), Some(Step::AgreeToTransfer));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_empty_foreign_read_accepted_when_strict() {
        let mut config = fast_config("76");
        config.absent_collection = AbsentCollectionPolicy::EmptyOnly;
        let (orchestrator, _connector) =
            orchestrator(ledger_with(LedgerConfig::default()), config);

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.foreign_read, ForeignReadOutcome::Empty);
    }

    // =========================================================================
    // SELLER COPY AFTER TRANSFER
    // =========================================================================

    #[tokio::test]
    async fn test_kept_seller_copy_detected() {
        let double = ContractDouble::new(Misbehavior::KeepSellerCopy);
        let (orchestrator, connector) = orchestrator(double, fast_config("77"));

        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.step(), Some(Step::TransferPrivateAsset));
        assert!(matches!(
            err,
            ProtocolError::Verification {
                source: VerificationError::UnexpectedRecord { ref location, .. },
                ..
            } if location == "Org1MSPPrivateCollection"
        ));
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_kept_seller_copy_ignored_when_skipped() {
        let double = ContractDouble::new(Misbehavior::KeepSellerCopy);
        let mut config = fast_config("78");
        config.seller_copy_check = SellerCopyCheck::Skip;
        let (orchestrator, _connector) = orchestrator(double, config);

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.seller_copy, SellerCopyStatus::NotChecked);
        assert!(report.transferred.owner.contains("Retailer78"));
    }
}
