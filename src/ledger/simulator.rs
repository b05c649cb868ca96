// In-memory ledger used in place of real chain state. Models the token
// behaviors the custody core has to defend against: fee-on-transfer
// deductions and allowance bookkeeping.

use crate::data_structures::{AccountId, AssetId};
use crate::error::LedgerError;
use crate::ledger::interface::{AssetLedger, CheckpointId};
use async_trait::async_trait;
use ethers::types::U256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

// Balances and allowances, snapshotted wholesale per checkpoint.
#[derive(Default, Clone, Debug)]
struct LedgerState {
    // account -> asset -> balance
    balances: HashMap<AccountId, HashMap<AssetId, U256>>,
    // (owner, spender, asset) -> remaining allowance
    allowances: HashMap<(AccountId, AccountId, AssetId), U256>,
}

impl LedgerState {
    fn balance(&self, account: &AccountId, asset: &AssetId) -> U256 {
        self.balances
            .get(account)
            .and_then(|assets| assets.get(asset))
            .copied()
            .unwrap_or_else(U256::zero)
    }

    fn credit(&mut self, account: &AccountId, asset: &AssetId, amount: U256) {
        let entry = self
            .balances
            .entry(account.clone())
            .or_default()
            .entry(asset.clone())
            .or_insert_with(U256::zero);
        *entry += amount;
    }

    fn debit(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let have = self.balance(account, asset);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                asset: asset.clone(),
                have,
                need: amount,
            });
        }
        if let Some(balance) = self
            .balances
            .get_mut(account)
            .and_then(|assets| assets.get_mut(asset))
        {
            *balance = have - amount;
        }
        Ok(())
    }
}

pub struct LedgerSimulator {
    state: Mutex<LedgerState>,
    // asset -> fee in basis points deducted from the recipient on every
    // transfer (fee is burned). Deliberately outside the snapshotted state:
    // token behavior is not custody state and must survive rollback.
    transfer_fees: Mutex<HashMap<AssetId, u32>>,
    checkpoints: Mutex<HashMap<u64, LedgerState>>,
    next_checkpoint: AtomicU64,
}

impl LedgerSimulator {
    pub fn new() -> Self {
        LedgerSimulator {
            state: Mutex::new(LedgerState::default()),
            transfer_fees: Mutex::new(HashMap::new()),
            checkpoints: Mutex::new(HashMap::new()),
            next_checkpoint: AtomicU64::new(0),
        }
    }

    /// Credit `amount` of `asset` to `account` out of thin air. Test setup
    /// helper, not part of the AssetLedger surface.
    pub fn mint(&self, account: &AccountId, asset: &AssetId, amount: U256) {
        let mut state = self.state.lock().unwrap();
        state.credit(account, asset, amount);
    }

    /// Make `asset` behave like a fee-on-transfer token: the recipient of
    /// every transfer is credited `amount` minus `fee_bps` basis points.
    pub fn set_transfer_fee(&self, asset: &AssetId, fee_bps: u32) {
        assert!(fee_bps <= 10_000, "fee cannot exceed 100%");
        self.transfer_fees
            .lock()
            .unwrap()
            .insert(asset.clone(), fee_bps);
    }

    fn credited_amount(&self, asset: &AssetId, amount: U256) -> U256 {
        let fees = self.transfer_fees.lock().unwrap();
        match fees.get(asset) {
            Some(fee_bps) if *fee_bps > 0 => {
                let fee = amount * U256::from(*fee_bps) / U256::from(10_000u32);
                amount - fee
            }
            _ => amount,
        }
    }
}

impl Default for LedgerSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetLedger for LedgerSimulator {
    async fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<U256, LedgerError> {
        Ok(self.state.lock().unwrap().balance(account, asset))
    }

    async fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let credited = self.credited_amount(asset, amount);
        let mut state = self.state.lock().unwrap();
        state.debit(from, asset, amount)?;
        // Fee-on-transfer: the difference between debited and credited is burned.
        state.credit(to, asset, credited);
        log::debug!(
            "ledger: moved {} {} from {} to {} (credited {})",
            amount,
            asset.token_symbol,
            from.address,
            to.address,
            credited
        );
        Ok(())
    }

    async fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let credited = self.credited_amount(asset, amount);
        let mut state = self.state.lock().unwrap();
        let key = (owner.clone(), spender.clone(), asset.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or_else(U256::zero);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.address.clone(),
                asset: asset.clone(),
                have: allowed,
                need: amount,
            });
        }
        state.debit(owner, asset, amount)?;
        state.allowances.insert(key, allowed - amount);
        state.credit(to, asset, credited);
        Ok(())
    }

    async fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        state
            .allowances
            .insert((owner.clone(), spender.clone(), asset.clone()), amount);
        Ok(())
    }

    async fn allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<U256, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .allowances
            .get(&(owner.clone(), spender.clone(), asset.clone()))
            .copied()
            .unwrap_or_else(U256::zero))
    }

    async fn checkpoint(&self) -> CheckpointId {
        let id = self.next_checkpoint.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.state.lock().unwrap().clone();
        self.checkpoints.lock().unwrap().insert(id, snapshot);
        CheckpointId(id)
    }

    async fn rollback(&self, checkpoint: CheckpointId) -> Result<(), LedgerError> {
        let snapshot = self
            .checkpoints
            .lock()
            .unwrap()
            .remove(&checkpoint.0)
            .ok_or(LedgerError::UnknownCheckpoint(checkpoint.0))?;
        // Checkpoints taken after this one describe state that no longer
        // exists; drop them.
        self.checkpoints
            .lock()
            .unwrap()
            .retain(|id, _| *id < checkpoint.0);
        *self.state.lock().unwrap() = snapshot;
        log::debug!("ledger: rolled back to checkpoint {}", checkpoint.0);
        Ok(())
    }

    async fn commit(&self, checkpoint: CheckpointId) {
        self.checkpoints.lock().unwrap().remove(&checkpoint.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(addr: &str) -> AccountId {
        AccountId::new(1, addr)
    }

    #[tokio::test]
    async fn transfer_moves_exact_amount() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let (alice, bob) = (account("alice"), account("bob"));
        ledger.mint(&alice, &tok, U256::from(1000));

        ledger
            .transfer(&tok, &alice, &bob, U256::from(300))
            .await
            .unwrap();

        assert_eq!(ledger.balance_of(&alice, &tok).await.unwrap(), U256::from(700));
        assert_eq!(ledger.balance_of(&bob, &tok).await.unwrap(), U256::from(300));
    }

    #[tokio::test]
    async fn transfer_fails_on_insufficient_balance() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let (alice, bob) = (account("alice"), account("bob"));
        ledger.mint(&alice, &tok, U256::from(50));

        let err = ledger
            .transfer(&tok, &alice, &bob, U256::from(100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        // Nothing moved.
        assert_eq!(ledger.balance_of(&alice, &tok).await.unwrap(), U256::from(50));
        assert_eq!(ledger.balance_of(&bob, &tok).await.unwrap(), U256::zero());
    }

    #[tokio::test]
    async fn fee_on_transfer_credits_less_than_debited() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "FEE", "0xfee");
        let (alice, bob) = (account("alice"), account("bob"));
        ledger.mint(&alice, &tok, U256::from(1000));
        ledger.set_transfer_fee(&tok, 300); // 3%

        ledger
            .transfer(&tok, &alice, &bob, U256::from(1000))
            .await
            .unwrap();

        assert_eq!(ledger.balance_of(&alice, &tok).await.unwrap(), U256::zero());
        // 3% burned in transit.
        assert_eq!(ledger.balance_of(&bob, &tok).await.unwrap(), U256::from(970));
    }

    #[tokio::test]
    async fn transfer_from_consumes_allowance() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let (owner, spender, dest) = (account("owner"), account("spender"), account("dest"));
        ledger.mint(&owner, &tok, U256::from(500));
        ledger
            .approve(&owner, &spender, &tok, U256::from(200))
            .await
            .unwrap();

        ledger
            .transfer_from(&spender, &owner, &dest, &tok, U256::from(150))
            .await
            .unwrap();
        assert_eq!(
            ledger.allowance(&owner, &spender, &tok).await.unwrap(),
            U256::from(50)
        );
        assert_eq!(ledger.balance_of(&dest, &tok).await.unwrap(), U256::from(150));

        // Remaining allowance does not cover another 150.
        let err = ledger
            .transfer_from(&spender, &owner, &dest, &tok, U256::from(150))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
    }

    #[tokio::test]
    async fn approve_sets_rather_than_accumulates() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let (owner, spender) = (account("owner"), account("spender"));

        ledger
            .approve(&owner, &spender, &tok, U256::from(100))
            .await
            .unwrap();
        ledger
            .approve(&owner, &spender, &tok, U256::from(70))
            .await
            .unwrap();

        // Second approval replaces the first; no summing.
        assert_eq!(
            ledger.allowance(&owner, &spender, &tok).await.unwrap(),
            U256::from(70)
        );
    }

    #[tokio::test]
    async fn rollback_restores_balances_and_allowances() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let (alice, bob) = (account("alice"), account("bob"));
        ledger.mint(&alice, &tok, U256::from(1000));

        let cp = ledger.checkpoint().await;
        ledger
            .transfer(&tok, &alice, &bob, U256::from(400))
            .await
            .unwrap();
        ledger.approve(&alice, &bob, &tok, U256::from(99)).await.unwrap();

        ledger.rollback(cp).await.unwrap();

        assert_eq!(ledger.balance_of(&alice, &tok).await.unwrap(), U256::from(1000));
        assert_eq!(ledger.balance_of(&bob, &tok).await.unwrap(), U256::zero());
        assert_eq!(ledger.allowance(&alice, &bob, &tok).await.unwrap(), U256::zero());

        // A checkpoint can only be rolled back once.
        let err = ledger.rollback(cp).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCheckpoint(_)));
    }

    #[tokio::test]
    async fn commit_discards_checkpoint() {
        let ledger = LedgerSimulator::new();
        let tok = AssetId::token(1, "TOK", "0xtok");
        let alice = account("alice");
        ledger.mint(&alice, &tok, U256::from(10));

        let cp = ledger.checkpoint().await;
        ledger.commit(cp).await;
        let err = ledger.rollback(cp).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCheckpoint(_)));
    }
}
