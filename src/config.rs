use crate::data_structures::{AccountId, AssetId};

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    // The chain this module instance is deployed on.
    pub local_chain_id: u64,

    // Address under which the module holds custody balances.
    pub module_address: String,

    // Symbol of the chain's native asset, used for the native sentinel.
    pub native_symbol: String,
}

impl BridgeConfig {
    // Custody account of the module itself on the local chain.
    pub fn module_account(&self) -> AccountId {
        AccountId::new(self.local_chain_id, self.module_address.clone())
    }

    pub fn native_asset(&self) -> AssetId {
        AssetId::native(self.local_chain_id, self.native_symbol.clone())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            local_chain_id: 1,
            module_address: "0xbridge_module".to_string(),
            native_symbol: "ETH".to_string(),
        }
    }
}
