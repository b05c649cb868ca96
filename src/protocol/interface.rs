use crate::bridge::types::{CanonicalTransferRecord, TransferIntent};
use crate::data_structures::AccountId;
use crate::error::RegistrationError;
use async_trait::async_trait;
use ethers::types::U256;

/// Trait defining the external transaction-management protocol the core
/// delegates cross-chain settlement to. This allows mocking or interfacing
/// with a real protocol deployment.
///
/// `register` either accepts the intent atomically, pulling the agreed
/// custody (consuming the module's allowance for tokenized assets, taking
/// the forwarded `native_value` for native ones), or fails without effect.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Account the protocol pulls custody into. Allowances are granted to
    /// this account before registration.
    fn custodian(&self) -> AccountId;

    /// Registers the intent and returns the protocol's canonical record of
    /// the negotiated transfer.
    async fn register(
        &self,
        intent: &TransferIntent,
        native_value: U256,
    ) -> Result<CanonicalTransferRecord, RegistrationError>;
}
