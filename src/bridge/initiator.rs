// Cross-chain initiation: allowance grant plus registration with the
// external protocol. Runs inside an orchestrator unit of work; any failure
// here reverts the whole call, including the allowance grant.

use crate::bridge::types::{CanonicalTransferRecord, TransferIntent};
use crate::data_structures::{AccountId, CorrelationId};
use crate::error::BridgeResult;
use crate::events::BridgeEvent;
use crate::ledger::AssetLedger;
use crate::protocol::TransactionManager;
use ethers::types::U256;
use std::sync::Arc;

pub struct CrossChainInitiator {
    module: AccountId,
    ledger: Arc<dyn AssetLedger>,
    manager: Arc<dyn TransactionManager>,
}

impl CrossChainInitiator {
    pub fn new(
        module: AccountId,
        ledger: Arc<dyn AssetLedger>,
        manager: Arc<dyn TransactionManager>,
    ) -> Self {
        CrossChainInitiator {
            module,
            ledger,
            manager,
        }
    }

    /// Grants the protocol's custodian rights over exactly `intent.amount`
    /// and invokes the protocol's registration entry point. Native intents
    /// forward the amount as native value instead of an allowance.
    ///
    /// The allowance is SET to the required amount, never accumulated, so a
    /// stale allowance left by a prior failed call can neither cause a
    /// double-spend nor silently starve this registration.
    pub async fn prepare_and_submit(
        &self,
        correlation_id: &CorrelationId,
        intent: &TransferIntent,
        pending_events: &mut Vec<BridgeEvent>,
    ) -> BridgeResult<CanonicalTransferRecord> {
        let native_value = if intent.sending_asset.is_native() {
            intent.amount
        } else {
            let custodian = self.manager.custodian();
            self.ledger
                .approve(&self.module, &custodian, &intent.sending_asset, intent.amount)
                .await?;
            log::debug!(
                "initiator: approved {} {} for custodian {}",
                intent.amount,
                intent.sending_asset.token_symbol,
                custodian.address
            );
            U256::zero()
        };

        let record = self.manager.register(intent, native_value).await?;

        log::info!(
            "initiator: correlation {} linked to protocol tx {}",
            hex::encode(correlation_id),
            record.protocol_tx_id
        );
        pending_events.push(BridgeEvent::ProtocolLinked {
            correlation_id: *correlation_id,
            protocol_tx_id: record.protocol_tx_id.clone(),
            transfer: record.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        });

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::types::DestinationParams;
    use crate::data_structures::AssetId;
    use crate::ledger::LedgerSimulator;
    use crate::protocol::TransactionManagerSim;

    struct Env {
        ledger: Arc<LedgerSimulator>,
        manager: Arc<TransactionManagerSim>,
        initiator: CrossChainInitiator,
        module: AccountId,
        custodian: AccountId,
    }

    fn setup() -> Env {
        let ledger = Arc::new(LedgerSimulator::new());
        let module = AccountId::new(1, "0xmodule");
        let custodian = AccountId::new(1, "0xcustodian");
        let manager = Arc::new(TransactionManagerSim::new(
            ledger.clone(),
            module.clone(),
            custodian.clone(),
        ));
        let initiator =
            CrossChainInitiator::new(module.clone(), ledger.clone(), manager.clone());
        Env {
            ledger,
            manager,
            initiator,
            module,
            custodian,
        }
    }

    fn intent(asset: AssetId, amount: u64) -> TransferIntent {
        TransferIntent {
            sending_asset: asset,
            amount: U256::from(amount),
            destination: DestinationParams {
                chain_id: 10,
                receiver: "0xreceiver".to_string(),
                payload: vec![],
            },
        }
    }

    #[tokio::test]
    async fn allowance_is_reset_not_accumulated_across_calls() {
        let env = setup();
        let usdc = AssetId::token(1, "USDC", "0xusdc");
        env.ledger.mint(&env.module, &usdc, U256::from(10_000));

        // First registration is rejected after the approve; the allowance
        // from the failed attempt is then stale.
        env.manager.reject_next("down for maintenance");
        let mut events = Vec::new();
        let first = intent(usdc.clone(), 700);
        env.initiator
            .prepare_and_submit(&[1u8; 32], &first, &mut events)
            .await
            .unwrap_err();
        assert_eq!(
            env.ledger.allowance(&env.module, &env.custodian, &usdc).await.unwrap(),
            U256::from(700)
        );

        // A second call with a smaller amount must overwrite, not add.
        // Reject again so the allowance is observable after the call.
        env.manager.reject_next("still down");
        let second = intent(usdc.clone(), 300);
        env.initiator
            .prepare_and_submit(&[2u8; 32], &second, &mut events)
            .await
            .unwrap_err();
        assert_eq!(
            env.ledger.allowance(&env.module, &env.custodian, &usdc).await.unwrap(),
            U256::from(300)
        );
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn successful_submit_buffers_linking_event() {
        let env = setup();
        let usdc = AssetId::token(1, "USDC", "0xusdc");
        env.ledger.mint(&env.module, &usdc, U256::from(1000));

        let mut events = Vec::new();
        let record = env
            .initiator
            .prepare_and_submit(&[3u8; 32], &intent(usdc.clone(), 1000), &mut events)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            BridgeEvent::ProtocolLinked {
                correlation_id,
                protocol_tx_id,
                transfer,
                ..
            } => {
                assert_eq!(correlation_id, &[3u8; 32]);
                assert_eq!(protocol_tx_id, &record.protocol_tx_id);
                assert_eq!(transfer, &record);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn native_intent_forwards_value_without_approval() {
        let env = setup();
        let eth = AssetId::native(1, "ETH");
        env.ledger.mint(&env.module, &eth, U256::from(5000));

        let mut events = Vec::new();
        env.initiator
            .prepare_and_submit(&[4u8; 32], &intent(eth.clone(), 5000), &mut events)
            .await
            .unwrap();

        // Value moved to the custodian; no allowance involved.
        assert_eq!(
            env.ledger.balance_of(&env.custodian, &eth).await.unwrap(),
            U256::from(5000)
        );
        assert_eq!(
            env.ledger.allowance(&env.module, &env.custodian, &eth).await.unwrap(),
            U256::zero()
        );
    }
}
