//! # End-to-End Scenario
//!
//! The literal Org1 → Org2 transfer of `asset42`, agreement visibility from
//! both organizations, and read idempotence.

#[cfg(test)]
mod tests {
    use crate::fixtures::{fast_config, ledger, orchestrator, properties};
    use pa_01_asset_state::AssetPhase;
    use pa_02_transfer_protocol::{ForeignReadOutcome, Role, SellerCopyStatus, Step};
    use shared_types::{AssetSecret, ContractOperation, Invocation, MspId};

    // =========================================================================
    // LITERAL SCENARIO
    // =========================================================================

    #[tokio::test]
    async fn test_literal_scenario() {
        let ledger = ledger();
        let (orchestrator, connector) = orchestrator(ledger.clone(), fast_config("42"));

        let report = orchestrator.run().await.unwrap();

        // Ledger seeded with the six base assets
        assert_eq!(report.ledger_assets.len(), 6);
        assert!(report.ledger_assets.iter().any(|a| a.asset_id == "asset1"));

        // Creation as Org1
        assert_eq!(report.created.asset_id, "asset42");
        assert_eq!(report.created.color, "green");
        assert_eq!(report.created.size, 20);
        assert_eq!(report.created.appraised_value, 100);
        assert!(report.created.owner.contains("Farmer42"));

        // Transfer without agreement rejected
        assert!(report.negative_path.is_rejected());
        assert_eq!(report.foreign_read, ForeignReadOutcome::Empty);

        // Agreement by Org2, transfer, buyer's private copy
        assert_eq!(report.agreement.asset_id, "asset42");
        assert!(report.agreement.buyer_id.contains("Retailer42"));
        assert!(report.transferred.owner.contains("Retailer42"));
        assert_eq!(report.buyer_details.asset_id, "asset42");
        assert_eq!(report.buyer_details.secret, AssetSecret::new(1234));
        assert_eq!(report.seller_copy, SellerCopyStatus::Absent);

        // History: creation then transfer
        assert_eq!(report.history.len(), 2);
        assert!(report.history[0].block_number < report.history[1].block_number);
        let first = report.history[0].value.as_ref().unwrap();
        assert!(first.owner.contains("Farmer42"));
        assert!(report.history[0].creator.starts_with("x509::CN=Farmer42"));
        assert_eq!(
            report.history[1].transferred_to.as_deref(),
            Some("Farmer42 is transferring asset42 to Retailer42")
        );

        assert_eq!(report.completed, Step::SEQUENCE.to_vec());
        assert_eq!(connector.open_connections(), 0);

        let lifecycle = ledger.lifecycle("asset42").unwrap();
        assert_eq!(lifecycle.phase, AssetPhase::PrivateOwned);
        assert_eq!(lifecycle.owner_msp(), Some(&MspId::new("Org2MSP")));
        assert_eq!(lifecycle.transfers, 1);
    }

    #[tokio::test]
    async fn test_repeated_runs_share_one_ledger() {
        let ledger = ledger();

        let (first, _) = orchestrator(ledger.clone(), fast_config("a1"));
        let first = first.run().await.unwrap();
        let (second, connector) = orchestrator(ledger.clone(), fast_config("b2"));
        let second = second.run().await.unwrap();

        assert!(first.is_complete());
        assert!(second.is_complete());
        assert!(second
            .ledger_assets
            .iter()
            .any(|a| a.asset_id == "asseta1" && a.owner.contains("Retailera1")));
        assert!(second.transferred.owner.contains("Retailerb2"));
        assert_eq!(connector.open_connections(), 0);
    }

    // =========================================================================
    // AGREEMENT ROUND TRIP
    // =========================================================================

    #[tokio::test]
    async fn test_agreement_readable_by_either_org() {
        let config = fast_config("31");
        let (orchestrator, _connector) = orchestrator(ledger(), config.clone());
        let seller = orchestrator.open(&config.seller, Role::Seller).await.unwrap();
        let buyer = orchestrator.open(&config.buyer, Role::Buyer).await.unwrap();

        let props = properties(&config);
        let mut tracker = pa_01_asset_state::AssetLifecycle::new(props.asset_id.as_str());
        orchestrator
            .create_private_asset(&seller, &mut tracker, &props)
            .await
            .unwrap();
        orchestrator
            .agree_to_transfer(&buyer, &mut tracker, &props.secret)
            .await
            .unwrap();

        let from_seller = orchestrator
            .read_transfer_agreement(&seller, &tracker)
            .await
            .unwrap();
        let from_buyer = orchestrator
            .read_transfer_agreement(&buyer, &tracker)
            .await
            .unwrap();

        assert_eq!(from_seller, from_buyer);
        assert_eq!(from_seller.asset_id, "asset31");
        assert!(from_seller.buyer_id.contains("Retailer31"));

        seller.release();
        buyer.release();
    }

    // =========================================================================
    // READ IDEMPOTENCE
    // =========================================================================

    #[tokio::test]
    async fn test_reads_are_side_effect_free() {
        let ledger = ledger();
        let (orchestrator, _connector) = orchestrator(ledger.clone(), fast_config("55"));
        orchestrator.run().await.unwrap();

        let session = orchestrator
            .open(&orchestrator.config().buyer, Role::Buyer)
            .await
            .unwrap();
        let height = ledger.height();

        let all_first = session
            .evaluate(Invocation::new(ContractOperation::GetAllAssets))
            .await
            .unwrap();
        let all_second = session
            .evaluate(Invocation::new(ContractOperation::GetAllAssets))
            .await
            .unwrap();
        assert_eq!(all_first, all_second);

        let read = || Invocation::new(ContractOperation::ReadAsset).arg("asset55");
        let asset_first = session.evaluate(read()).await.unwrap();
        let asset_second = session.evaluate(read()).await.unwrap();
        assert_eq!(asset_first, asset_second);

        let listed = orchestrator.list_all_assets(&session).await.unwrap();
        assert_eq!(
            listed,
            serde_json::from_slice::<Vec<shared_types::Asset>>(&all_first).unwrap()
        );
        assert_eq!(ledger.height(), height);
    }
}
