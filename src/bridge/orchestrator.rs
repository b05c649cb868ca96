// Bridge orchestration core: the four public entry points composing custody
// acquisition, optional swap execution, delta verification, and either
// cross-chain initiation or final delivery.
//
// Call shape shared by all entry points:
//   Idle -> CustodyAcquired -> (SwapsApplied)? -> Verified -> Delegated/Delivered -> Idle
// Every failure aborts back to Idle: a ledger checkpoint taken on entry is
// rolled back and buffered events are dropped, so no intermediate state is
// ever observable after a failed call.
//
// Amounts are only ever authorized by measured balances. Delegated calls
// (swaps, transfers, registration) may run untrusted code; their declared
// effects are never trusted, the module's own before/after balances are.

use crate::bridge::initiator::CrossChainInitiator;
use crate::bridge::types::{CanonicalTransferRecord, TrackingRecord, TransferIntent};
use crate::config::BridgeConfig;
use crate::data_structures::{AccountId, AssetId};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BridgeEvent, EventSink};
use crate::ledger::{AssetLedger, CheckpointId};
use crate::protocol::TransactionManager;
use crate::swap::{SwapExecutor, SwapStep};
use ethers::types::U256;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct BridgeOrchestrator {
    module: AccountId,
    native_asset: AssetId,
    ledger: Arc<dyn AssetLedger>,
    swap_executor: Arc<dyn SwapExecutor>,
    initiator: CrossChainInitiator,
    events: Arc<dyn EventSink>,
    // Defensive reentrancy guard. The execution model is one call at a
    // time; a delegated call that tries to re-enter an entry point is
    // denied instead of observing custody mid-flight.
    entry_guard: Mutex<()>,
}

impl BridgeOrchestrator {
    pub fn new(
        config: &BridgeConfig,
        ledger: Arc<dyn AssetLedger>,
        swap_executor: Arc<dyn SwapExecutor>,
        manager: Arc<dyn TransactionManager>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let module = config.module_account();
        let initiator = CrossChainInitiator::new(module.clone(), ledger.clone(), manager);
        BridgeOrchestrator {
            module,
            native_asset: config.native_asset(),
            ledger,
            swap_executor,
            initiator,
            events,
            entry_guard: Mutex::new(()),
        }
    }

    pub fn module_account(&self) -> &AccountId {
        &self.module
    }

    /// Takes custody of `intent.amount` of the sending asset from `caller`
    /// and hands it to the external protocol.
    pub async fn start_bridge(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        intent: &TransferIntent,
        attached_native: U256,
    ) -> BridgeResult<CanonicalTransferRecord> {
        let _guard = self
            .entry_guard
            .try_lock()
            .map_err(|_| BridgeError::ReentrantCall)?;
        let checkpoint = self.ledger.checkpoint().await;
        let mut pending = Vec::new();
        let result = self
            .start_bridge_inner(caller, record, intent, attached_native, &mut pending)
            .await;
        self.finish(checkpoint, pending, result).await
    }

    async fn start_bridge_inner(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        intent: &TransferIntent,
        attached_native: U256,
        pending: &mut Vec<BridgeEvent>,
    ) -> BridgeResult<CanonicalTransferRecord> {
        self.receive_attached_native(caller, attached_native).await?;

        if intent.sending_asset.is_native() {
            if attached_native != intent.amount {
                return Err(BridgeError::InvalidAmount {
                    expected: intent.amount,
                    measured: attached_native,
                });
            }
        } else {
            self.pull_exact(caller, &intent.sending_asset, intent.amount)
                .await?;
        }
        log::debug!(
            "bridge: custody of {} {} acquired for correlation {}",
            intent.amount,
            intent.sending_asset.token_symbol,
            hex::encode(record.correlation_id)
        );

        let transfer = self
            .initiator
            .prepare_and_submit(&record.correlation_id, intent, pending)
            .await?;

        pending.push(BridgeEvent::BridgeStarted {
            correlation_id: record.correlation_id,
            record: record.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        });
        Ok(transfer)
    }

    /// Runs the swap sequence, requires the module's balance of the sending
    /// asset to have grown by AT LEAST `intent.amount` (surplus is kept in
    /// the module), then proceeds as start_bridge from the
    /// custody-confirmed point.
    pub async fn swap_and_start_bridge(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        steps: &[SwapStep],
        intent: &TransferIntent,
        attached_native: U256,
    ) -> BridgeResult<CanonicalTransferRecord> {
        let _guard = self
            .entry_guard
            .try_lock()
            .map_err(|_| BridgeError::ReentrantCall)?;
        let checkpoint = self.ledger.checkpoint().await;
        let mut pending = Vec::new();
        let result = self
            .swap_and_start_inner(caller, record, steps, intent, attached_native, &mut pending)
            .await;
        self.finish(checkpoint, pending, result).await
    }

    async fn swap_and_start_inner(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        steps: &[SwapStep],
        intent: &TransferIntent,
        attached_native: U256,
        pending: &mut Vec<BridgeEvent>,
    ) -> BridgeResult<CanonicalTransferRecord> {
        self.receive_attached_native(caller, attached_native).await?;

        let before = self
            .ledger
            .balance_of(&self.module, &intent.sending_asset)
            .await?;
        // Steps are not individually verified; only the net effect on the
        // sending asset is.
        for step in steps {
            self.swap_executor.execute(&self.module, step).await?;
        }
        let after = self
            .ledger
            .balance_of(&self.module, &intent.sending_asset)
            .await?;
        let produced = after.saturating_sub(before);
        if produced < intent.amount {
            return Err(BridgeError::InvalidAmount {
                expected: intent.amount,
                measured: produced,
            });
        }
        log::debug!(
            "bridge: swaps produced {} {} (required {}) for correlation {}",
            produced,
            intent.sending_asset.token_symbol,
            intent.amount,
            hex::encode(record.correlation_id)
        );

        // Only the first `amount` of the (possibly larger) output moves on.
        let transfer = self
            .initiator
            .prepare_and_submit(&record.correlation_id, intent, pending)
            .await?;

        pending.push(BridgeEvent::BridgeStarted {
            correlation_id: record.correlation_id,
            record: record.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        });
        Ok(transfer)
    }

    /// Destination-chain delivery: takes `amount` of `asset` from the
    /// trusted caller and forwards it in full to `receiver`. Caller
    /// authority is enforced by an access-control layer outside this core.
    pub async fn complete_bridge(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        asset: &AssetId,
        receiver: &AccountId,
        amount: U256,
        attached_native: U256,
    ) -> BridgeResult<()> {
        let _guard = self
            .entry_guard
            .try_lock()
            .map_err(|_| BridgeError::ReentrantCall)?;
        let checkpoint = self.ledger.checkpoint().await;
        let mut pending = Vec::new();
        let result = self
            .complete_bridge_inner(caller, record, asset, receiver, amount, attached_native, &mut pending)
            .await;
        self.finish(checkpoint, pending, result).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn complete_bridge_inner(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        asset: &AssetId,
        receiver: &AccountId,
        amount: U256,
        attached_native: U256,
        pending: &mut Vec<BridgeEvent>,
    ) -> BridgeResult<()> {
        self.receive_attached_native(caller, attached_native).await?;

        if asset.is_native() {
            if attached_native != amount {
                return Err(BridgeError::InvalidNativeAmount {
                    expected: amount,
                    attached: attached_native,
                });
            }
        } else {
            if !attached_native.is_zero() {
                return Err(BridgeError::UnexpectedNativeValue {
                    attached: attached_native,
                });
            }
            self.pull_exact(caller, asset, amount).await?;
        }

        self.ledger
            .transfer(asset, &self.module, receiver, amount)
            .await?;

        pending.push(BridgeEvent::BridgeCompleted {
            correlation_id: record.correlation_id,
            asset: asset.clone(),
            receiver: receiver.clone(),
            amount,
            timestamp: chrono::Utc::now().timestamp(),
        });
        Ok(())
    }

    /// Destination-chain delivery after swaps: whatever net amount of
    /// `final_asset` the steps produce is forwarded to `receiver`. A zero
    /// net product is a no-op delivery, not an error; the completion event
    /// is emitted with amount zero. Returns the delivered amount.
    pub async fn swap_and_complete_bridge(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        steps: &[SwapStep],
        final_asset: &AssetId,
        receiver: &AccountId,
        attached_native: U256,
    ) -> BridgeResult<U256> {
        let _guard = self
            .entry_guard
            .try_lock()
            .map_err(|_| BridgeError::ReentrantCall)?;
        let checkpoint = self.ledger.checkpoint().await;
        let mut pending = Vec::new();
        let result = self
            .swap_and_complete_inner(caller, record, steps, final_asset, receiver, attached_native, &mut pending)
            .await;
        self.finish(checkpoint, pending, result).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn swap_and_complete_inner(
        &self,
        caller: &AccountId,
        record: &TrackingRecord,
        steps: &[SwapStep],
        final_asset: &AssetId,
        receiver: &AccountId,
        attached_native: U256,
        pending: &mut Vec<BridgeEvent>,
    ) -> BridgeResult<U256> {
        self.receive_attached_native(caller, attached_native).await?;

        let before = self.ledger.balance_of(&self.module, final_asset).await?;
        for step in steps {
            self.swap_executor.execute(&self.module, step).await?;
        }
        let after = self.ledger.balance_of(&self.module, final_asset).await?;
        // Exact delta, floored at zero: pre-existing module balance is not
        // the caller's to receive.
        let final_amount = after.saturating_sub(before);

        if !final_amount.is_zero() {
            self.ledger
                .transfer(final_asset, &self.module, receiver, final_amount)
                .await?;
        } else {
            log::info!(
                "bridge: swaps produced no net {} for correlation {}, no-op delivery",
                final_asset.token_symbol,
                hex::encode(record.correlation_id)
            );
        }

        pending.push(BridgeEvent::BridgeCompleted {
            correlation_id: record.correlation_id,
            asset: final_asset.clone(),
            receiver: receiver.clone(),
            amount: final_amount,
            timestamp: chrono::Utc::now().timestamp(),
        });
        Ok(final_amount)
    }

    // Attached native value arrives with the call and reverts with the
    // checkpoint like every other effect.
    async fn receive_attached_native(
        &self,
        caller: &AccountId,
        attached_native: U256,
    ) -> BridgeResult<()> {
        if !attached_native.is_zero() {
            self.ledger
                .transfer(&self.native_asset, caller, &self.module, attached_native)
                .await?;
        }
        Ok(())
    }

    // Custody acquisition for tokenized assets: pull, then verify that the
    // module's measured balance grew by exactly `amount`. A token that
    // deducts fees in transit (or misreports its transfer) fails here.
    async fn pull_exact(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> BridgeResult<()> {
        let before = self.ledger.balance_of(&self.module, asset).await?;
        self.ledger
            .transfer_from(&self.module, caller, &self.module, asset, amount)
            .await?;
        let after = self.ledger.balance_of(&self.module, asset).await?;
        let measured = after.saturating_sub(before);
        if measured != amount {
            return Err(BridgeError::InvalidAmount {
                expected: amount,
                measured,
            });
        }
        Ok(())
    }

    // Commit-or-rollback tail shared by all entry points. Events buffered
    // during the call are only emitted once the ledger state is committed.
    async fn finish<T>(
        &self,
        checkpoint: CheckpointId,
        pending: Vec<BridgeEvent>,
        result: BridgeResult<T>,
    ) -> BridgeResult<T> {
        match result {
            Ok(value) => {
                self.ledger.commit(checkpoint).await;
                for event in pending {
                    self.events.emit(event);
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.ledger.rollback(checkpoint).await {
                    log::error!("bridge: rollback failed: {rollback_err}");
                }
                log::warn!("bridge: call aborted: {err}");
                Err(err)
            }
        }
    }
}
