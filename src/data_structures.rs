use serde::{Deserialize, Serialize};

// Sentinel token address used to denote the chain's native asset.
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// Opaque identifier tying one logical bridging operation together across
// both chains. Caller-supplied, echoed in events, otherwise unused.
pub type CorrelationId = [u8; 32];

// Transaction identifier assigned by the external protocol.
// Using String for now, could be a specific hash type like H256.
pub type TransactionId = String;

// Represent a user account on some chain
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountId {
    pub chain_id: u64,
    pub address: String, // Using String for simplicity, could be H160 or similar fixed-size type
}

impl AccountId {
    pub fn new(chain_id: u64, address: impl Into<String>) -> Self {
        AccountId { chain_id, address: address.into() }
    }
}

// Represent a specific asset on a specific chain
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetId {
    pub chain_id: u64,
    pub token_symbol: String,  // e.g., "ETH", "USDC"
    pub token_address: String, // e.g., "0x...", zero address for the native asset
}

impl AssetId {
    pub fn token(chain_id: u64, symbol: impl Into<String>, address: impl Into<String>) -> Self {
        AssetId {
            chain_id,
            token_symbol: symbol.into(),
            token_address: address.into(),
        }
    }

    // The native-value asset of a chain (ETH, MATIC, ...)
    pub fn native(chain_id: u64, symbol: impl Into<String>) -> Self {
        AssetId {
            chain_id,
            token_symbol: symbol.into(),
            token_address: NATIVE_TOKEN_ADDRESS.to_string(),
        }
    }

    pub fn is_native(&self) -> bool {
        self.token_address == NATIVE_TOKEN_ADDRESS
    }
}
