use crate::data_structures::AssetId;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

// One trade instruction. An ordered sequence of steps is applied left to
// right; each step's output becomes available balance for the next step or
// for the final accounting. The executor gives no usable return amount, so
// callers must measure the net effect themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStep {
    pub input_asset: AssetId,
    pub output_asset: AssetId,
    pub amount_in: U256,
    // Routing payload, opaque to the custody core.
    pub route: Vec<u8>,
}

impl SwapStep {
    pub fn new(input_asset: AssetId, output_asset: AssetId, amount_in: U256) -> Self {
        SwapStep {
            input_asset,
            output_asset,
            amount_in,
            route: Vec::new(),
        }
    }
}
