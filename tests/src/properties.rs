//! # Protocol Properties
//!
//! Generated-input checks of creation consistency and pre-agreement
//! rejection. Each case runs on its own ledger inside a current-thread
//! runtime.

#[cfg(test)]
mod tests {
    use crate::fixtures::{fast_config, ledger, orchestrator};
    use pa_01_asset_state::{AssetLifecycle, AssetPhase};
    use pa_02_transfer_protocol::{AssetTemplate, NegativePathOutcome, Role};
    use proptest::prelude::*;
    use shared_types::{AssetSecret, ContractOperation, Invocation, MspId};
    use tokio_test::block_on;

    fn arb_template() -> impl Strategy<Value = AssetTemplate> {
        ("[a-z]{1,12}", 1u32..10_000, 1u64..10_000_000, any::<u64>()).prop_map(
            |(color, size, appraised_value, secret)| AssetTemplate {
                color,
                size,
                appraised_value,
                secret: AssetSecret::new(secret),
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: right after creation the public record matches the
        /// supplied fields, names the creator, and carries no secret.
        #[test]
        fn prop_creation_consistency(run_id in "[a-z]{2}[0-9]{1,4}", template in arb_template()) {
            let mut config = fast_config(&run_id);
            config.asset = template.clone();
            let (orchestrator, _connector) = orchestrator(ledger(), config.clone());

            let (asset, payload) = block_on(async {
                let seller = orchestrator.open(&config.seller, Role::Seller).await.unwrap();
                let props = config.asset.properties(config.asset_id());
                let mut tracker = AssetLifecycle::new(props.asset_id.as_str());
                let asset = orchestrator
                    .create_private_asset(&seller, &mut tracker, &props)
                    .await
                    .unwrap();
                let payload = seller
                    .evaluate(Invocation::new(ContractOperation::ReadAsset).arg(config.asset_id()))
                    .await
                    .unwrap();
                seller.release();
                (asset, payload)
            });

            let asset_id = config.asset_id();
            prop_assert_eq!(&asset.asset_id, &asset_id);
            prop_assert_eq!(&asset.color, &template.color);
            prop_assert_eq!(asset.size, template.size);
            prop_assert_eq!(asset.appraised_value, template.appraised_value);
            let creator = format!("Farmer{run_id}");
            prop_assert!(asset.is_owned_by(&creator));

            let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
            let object = json.as_object().unwrap();
            prop_assert!(!object.contains_key("secret"));
            prop_assert_eq!(object.len(), 5);
        }

        /// Property: without an agreement every transfer is rejected by the
        /// contract and the owner stays the seller.
        #[test]
        fn prop_transfer_rejected_without_agreement(
            run_id in "[a-z]{2}[0-9]{1,4}",
            buyer_org in 2u8..9,
        ) {
            let config = fast_config(&run_id);
            let ledger = ledger();
            let (orchestrator, _connector) = orchestrator(ledger.clone(), config.clone());
            let buyer_msp = MspId::new(format!("Org{buyer_org}MSP"));

            let outcome = block_on(async {
                let seller = orchestrator.open(&config.seller, Role::Seller).await.unwrap();
                let props = config.asset.properties(config.asset_id());
                let mut tracker = AssetLifecycle::new(props.asset_id.as_str());
                orchestrator
                    .create_private_asset(&seller, &mut tracker, &props)
                    .await
                    .unwrap();
                let outcome = orchestrator
                    .attempt_unauthorized_transfer(&seller, &tracker, &buyer_msp)
                    .await
                    .unwrap();
                seller.release();
                outcome
            });

            let rejected = matches!(
                outcome,
                NegativePathOutcome::Rejected { ref message }
                    if message.contains("AgreeToTransfer must be called by the buyer first")
            );
            prop_assert!(rejected, "unexpected negative path outcome: {}", outcome);
            let lifecycle = ledger.lifecycle(&config.asset_id()).unwrap();
            prop_assert_eq!(lifecycle.phase, AssetPhase::PrivateOwned);
            let seller_msp = MspId::new("Org1MSP");
            prop_assert_eq!(lifecycle.owner_msp(), Some(&seller_msp));
        }
    }
}
