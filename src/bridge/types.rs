// Types crossing the boundary between the caller, the custody core, and the
// external transaction-management protocol.

use crate::data_structures::{AccountId, AssetId, CorrelationId, TransactionId};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

// Receiving-chain parameters required by the external protocol. The payload
// carries the protocol's unlock conditions and is opaque to the custody core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationParams {
    pub chain_id: u64,
    pub receiver: String,
    pub payload: Vec<u8>,
}

// Everything needed to initiate one cross-chain move. Constructed by the
// caller, consumed and forwarded once, never persisted by the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub sending_asset: AssetId,
    pub amount: U256,
    pub destination: DestinationParams,
}

// Caller-supplied metadata for observability only. Every numeric value in
// here is advisory and must never authorize a transfer; only measured
// balances do that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub correlation_id: CorrelationId,
    pub integrator: String,
    pub referrer: String,
    pub sending_asset: AssetId,
    pub receiving_asset: AssetId,
    pub amount: U256,
    pub receiver: AccountId,
    pub destination_chain_id: u64,
}

// Returned by the external protocol after it accepts a transfer intent.
// Consumed immediately to emit the linking event; not stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTransferRecord {
    pub protocol_tx_id: TransactionId,
    pub sending_asset: AssetId,
    pub amount: U256,
    pub destination_chain_id: u64,
    pub custodian: AccountId,
    pub registered_at: i64,
}
