// Shared builders for unit and integration tests.

use crate::{
    bridge::types::{DestinationParams, TrackingRecord, TransferIntent},
    bridge::BridgeOrchestrator,
    config::BridgeConfig,
    data_structures::{AccountId, AssetId, CorrelationId},
    events::{BridgeEvent, ChannelEventSink},
    ledger::{AssetLedger, LedgerSimulator},
    protocol::TransactionManagerSim,
    swap::{DexSimulator, SwapExecutor},
};
use ethers::types::U256;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const SOURCE_CHAIN: u64 = 1;
pub const DEST_CHAIN: u64 = 10;

pub fn correlation_id(tag: u8) -> CorrelationId {
    [tag; 32]
}

pub fn random_correlation_id() -> CorrelationId {
    rand::thread_rng().gen()
}

pub fn native_asset() -> AssetId {
    AssetId::native(SOURCE_CHAIN, "ETH")
}

pub fn usdc() -> AssetId {
    AssetId::token(SOURCE_CHAIN, "USDC", "0xusdc")
}

pub fn dai() -> AssetId {
    AssetId::token(SOURCE_CHAIN, "DAI", "0xdai")
}

pub fn transfer_intent(asset: AssetId, amount: u64) -> TransferIntent {
    TransferIntent {
        sending_asset: asset,
        amount: U256::from(amount),
        destination: DestinationParams {
            chain_id: DEST_CHAIN,
            receiver: "0xdest_receiver".to_string(),
            payload: vec![],
        },
    }
}

pub fn tracking_record(
    correlation: CorrelationId,
    sending_asset: AssetId,
    amount: u64,
) -> TrackingRecord {
    TrackingRecord {
        correlation_id: correlation,
        integrator: "test-integrator".to_string(),
        referrer: "".to_string(),
        receiving_asset: AssetId::token(DEST_CHAIN, sending_asset.token_symbol.clone(), "0xremote"),
        sending_asset,
        amount: U256::from(amount),
        receiver: AccountId::new(DEST_CHAIN, "0xdest_receiver"),
        destination_chain_id: DEST_CHAIN,
    }
}

/// Fully wired bridge environment against in-memory simulators.
pub struct BridgeTestEnv {
    pub config: BridgeConfig,
    pub ledger: Arc<LedgerSimulator>,
    pub dex: Arc<DexSimulator>,
    pub manager: Arc<TransactionManagerSim>,
    pub orchestrator: Arc<BridgeOrchestrator>,
    pub event_rx: mpsc::UnboundedReceiver<BridgeEvent>,
    pub caller: AccountId,
    pub custodian: AccountId,
    pub pool: AccountId,
}

impl BridgeTestEnv {
    pub fn new() -> Self {
        let config = BridgeConfig::default();
        let ledger = Arc::new(LedgerSimulator::new());
        let pool = AccountId::new(SOURCE_CHAIN, "0xpool");
        let dex = Arc::new(DexSimulator::new(ledger.clone(), pool.clone()));
        Self::with_executor_internal(config, ledger, dex.clone(), dex, pool)
    }

    /// Like `new`, but with a caller-provided swap executor (the default
    /// DexSimulator is still built and wired to the same ledger so tests
    /// can pre-fund its pool if they want).
    pub fn with_executor(executor: Arc<dyn SwapExecutor>) -> Self {
        let config = BridgeConfig::default();
        let ledger = Arc::new(LedgerSimulator::new());
        let pool = AccountId::new(SOURCE_CHAIN, "0xpool");
        let dex = Arc::new(DexSimulator::new(ledger.clone(), pool.clone()));
        Self::with_executor_internal(config, ledger, dex, executor, pool)
    }

    fn with_executor_internal(
        config: BridgeConfig,
        ledger: Arc<LedgerSimulator>,
        dex: Arc<DexSimulator>,
        executor: Arc<dyn SwapExecutor>,
        pool: AccountId,
    ) -> Self {
        let custodian = AccountId::new(SOURCE_CHAIN, "0xcustodian");
        let manager = Arc::new(TransactionManagerSim::new(
            ledger.clone(),
            config.module_account(),
            custodian.clone(),
        ));
        let (sink, event_rx) = ChannelEventSink::new();
        let orchestrator = Arc::new(BridgeOrchestrator::new(
            &config,
            ledger.clone(),
            executor,
            manager.clone(),
            Arc::new(sink),
        ));
        BridgeTestEnv {
            config,
            ledger,
            dex,
            manager,
            orchestrator,
            event_rx,
            caller: AccountId::new(SOURCE_CHAIN, "0xcaller"),
            custodian,
            pool,
        }
    }

    /// Gives the caller `amount` of `asset` and, for tokens, an allowance
    /// letting the module pull it.
    pub async fn fund_caller(&self, asset: &AssetId, amount: u64) {
        let amount = U256::from(amount);
        self.ledger.mint(&self.caller, asset, amount);
        if !asset.is_native() {
            self.ledger
                .approve(&self.caller, &self.config.module_account(), asset, amount)
                .await
                .expect("approve in test setup");
        }
    }

    pub async fn balance(&self, account: &AccountId, asset: &AssetId) -> U256 {
        self.ledger
            .balance_of(account, asset)
            .await
            .expect("simulator balance query")
    }

    pub async fn module_balance(&self, asset: &AssetId) -> U256 {
        self.balance(&self.config.module_account(), asset).await
    }
}

impl Default for BridgeTestEnv {
    fn default() -> Self {
        Self::new()
    }
}
