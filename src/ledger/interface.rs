use crate::data_structures::{AccountId, AssetId};
use crate::error::LedgerError;
use async_trait::async_trait;
use ethers::types::U256;

/// Handle onto a point-in-time snapshot of ledger state. Rolling back to a
/// checkpoint undoes every mutation made after it was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CheckpointId(pub u64);

/// Trait defining the asset transfer primitive the bridge core runs against.
/// This allows mocking or interfacing with real chains/simulators.
///
/// The checkpoint surface reconstructs the all-or-nothing call semantics a
/// blockchain host environment would otherwise provide: each bridge entry
/// point takes a checkpoint on entry and either commits it or rolls back to
/// it, so no partial custody state survives a failed call.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Balance of `asset` held by `account`.
    async fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<U256, LedgerError>;

    /// Moves `amount` of `asset` from `from` to `to`, or fails atomically.
    /// Callers must never trust this to have moved the nominal amount;
    /// re-verify via balance delta (fee-on-transfer tokens exist).
    async fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// Allowance-consuming pull: `spender` moves `amount` of `owner`'s
    /// `asset` to `to`, decrementing the (owner, spender) allowance.
    async fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// SET the (owner, spender) allowance to exactly `amount`. Setting, not
    /// accumulating: a stale allowance from a prior failed call is
    /// overwritten, never added to.
    async fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    async fn allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<U256, LedgerError>;

    /// Snapshot current state.
    async fn checkpoint(&self) -> CheckpointId;

    /// Restore the state captured at `checkpoint`, discarding it and any
    /// checkpoints taken after it.
    async fn rollback(&self, checkpoint: CheckpointId) -> Result<(), LedgerError>;

    /// Discard `checkpoint` without restoring, making the mutations since
    /// it permanent.
    async fn commit(&self, checkpoint: CheckpointId);
}
