// Swap execution seam. The core never trusts an executor's reported output;
// it measures its own balance before and after the whole step sequence.

use crate::data_structures::{AccountId, AssetId};
use crate::error::SwapError;
use crate::ledger::AssetLedger;
use crate::swap::types::SwapStep;
use async_trait::async_trait;
use ethers::types::U256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Executes one trade against external liquidity, mutating the module's
/// ledger balances. Side effect only: no guaranteed return amount.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn execute(&self, module: &AccountId, step: &SwapStep) -> Result<(), SwapError>;
}

/// Exchange rate for a trading pair, amount_out = amount_in * num / den.
#[derive(Clone, Copy, Debug)]
pub struct SwapRate {
    pub num: u64,
    pub den: u64,
}

/// Fixed-rate DEX simulation trading against a pre-funded pool account on a
/// shared ledger. Rates are configured per directed pair; setting a poor
/// rate models slippage shortfall.
pub struct DexSimulator {
    ledger: Arc<dyn AssetLedger>,
    pool: AccountId,
    rates: Mutex<HashMap<(AssetId, AssetId), SwapRate>>,
}

impl DexSimulator {
    pub fn new(ledger: Arc<dyn AssetLedger>, pool: AccountId) -> Self {
        DexSimulator {
            ledger,
            pool,
            rates: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_rate(&self, input: &AssetId, output: &AssetId, rate: SwapRate) {
        assert!(rate.den > 0, "rate denominator must be nonzero");
        self.rates
            .lock()
            .unwrap()
            .insert((input.clone(), output.clone()), rate);
    }

    fn rate_for(&self, input: &AssetId, output: &AssetId) -> Result<SwapRate, SwapError> {
        self.rates
            .lock()
            .unwrap()
            .get(&(input.clone(), output.clone()))
            .copied()
            .ok_or_else(|| SwapError::UnsupportedPair {
                input: input.clone(),
                output: output.clone(),
            })
    }
}

#[async_trait]
impl SwapExecutor for DexSimulator {
    async fn execute(&self, module: &AccountId, step: &SwapStep) -> Result<(), SwapError> {
        let rate = self.rate_for(&step.input_asset, &step.output_asset)?;
        let amount_out = step.amount_in * U256::from(rate.num) / U256::from(rate.den);

        // Input leaves the module, output comes back from the pool. If the
        // pool cannot cover the output the ledger error propagates verbatim.
        self.ledger
            .transfer(&step.input_asset, module, &self.pool, step.amount_in)
            .await?;
        self.ledger
            .transfer(&step.output_asset, &self.pool, module, amount_out)
            .await?;

        log::debug!(
            "dex: swapped {} {} -> {} {} for {}",
            step.amount_in,
            step.input_asset.token_symbol,
            amount_out,
            step.output_asset.token_symbol,
            module.address
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerSimulator;

    fn setup() -> (Arc<LedgerSimulator>, DexSimulator, AccountId, AssetId, AssetId) {
        let ledger = Arc::new(LedgerSimulator::new());
        let pool = AccountId::new(1, "0xpool");
        let module = AccountId::new(1, "0xmodule");
        let dai = AssetId::token(1, "DAI", "0xdai");
        let usdc = AssetId::token(1, "USDC", "0xusdc");
        let dex = DexSimulator::new(ledger.clone(), pool.clone());
        ledger.mint(&pool, &usdc, U256::from(1_000_000));
        (ledger, dex, module, dai, usdc)
    }

    #[tokio::test]
    async fn executes_at_configured_rate() {
        let (ledger, dex, module, dai, usdc) = setup();
        ledger.mint(&module, &dai, U256::from(1000));
        dex.set_rate(&dai, &usdc, SwapRate { num: 99, den: 100 });

        let step = SwapStep::new(dai.clone(), usdc.clone(), U256::from(1000));
        dex.execute(&module, &step).await.unwrap();

        assert_eq!(ledger.balance_of(&module, &dai).await.unwrap(), U256::zero());
        assert_eq!(ledger.balance_of(&module, &usdc).await.unwrap(), U256::from(990));
    }

    #[tokio::test]
    async fn unknown_pair_is_rejected() {
        let (ledger, dex, module, dai, usdc) = setup();
        ledger.mint(&module, &dai, U256::from(1000));

        let step = SwapStep::new(dai, usdc, U256::from(1000));
        let err = dex.execute(&module, &step).await.unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedPair { .. }));
    }

    #[tokio::test]
    async fn insufficient_module_input_propagates_ledger_error() {
        let (_ledger, dex, module, dai, usdc) = setup();
        dex.set_rate(&dai, &usdc, SwapRate { num: 1, den: 1 });

        let step = SwapStep::new(dai, usdc, U256::from(1000));
        let err = dex.execute(&module, &step).await.unwrap_err();
        assert!(matches!(err, SwapError::Ledger(_)));
    }
}
