// Simulation of the external transaction-management protocol. Registration
// actually takes custody off the module (consuming its allowance, or the
// forwarded native value), so tests exercise the real custody handoff.

use crate::bridge::types::{CanonicalTransferRecord, TransferIntent};
use crate::data_structures::AccountId;
use crate::error::RegistrationError;
use crate::ledger::AssetLedger;
use crate::protocol::interface::TransactionManager;
use async_trait::async_trait;
use ethers::types::U256;
use rand::Rng;
use std::sync::{Arc, Mutex};

pub struct TransactionManagerSim {
    ledger: Arc<dyn AssetLedger>,
    // The module whose custody this protocol instance pulls from.
    module: AccountId,
    custodian: AccountId,
    // When set, the next register() call fails with this reason.
    reject_next: Mutex<Option<String>>,
}

impl TransactionManagerSim {
    pub fn new(ledger: Arc<dyn AssetLedger>, module: AccountId, custodian: AccountId) -> Self {
        TransactionManagerSim {
            ledger,
            module,
            custodian,
            reject_next: Mutex::new(None),
        }
    }

    /// Make the next registration fail, e.g. to test atomic rollback of a
    /// call that already acquired custody.
    pub fn reject_next(&self, reason: impl Into<String>) {
        *self.reject_next.lock().unwrap() = Some(reason.into());
    }

    fn fresh_tx_id() -> String {
        let bytes: [u8; 16] = rand::thread_rng().gen();
        format!("xtm-{}", hex::encode(bytes))
    }
}

#[async_trait]
impl TransactionManager for TransactionManagerSim {
    fn custodian(&self) -> AccountId {
        self.custodian.clone()
    }

    async fn register(
        &self,
        intent: &TransferIntent,
        native_value: U256,
    ) -> Result<CanonicalTransferRecord, RegistrationError> {
        if let Some(reason) = self.reject_next.lock().unwrap().take() {
            return Err(RegistrationError::Rejected(reason));
        }

        // Structural checks a real protocol would apply at its boundary.
        if intent.destination.receiver.is_empty() {
            return Err(RegistrationError::Rejected(
                "destination receiver missing".to_string(),
            ));
        }
        if intent.destination.chain_id == intent.sending_asset.chain_id {
            return Err(RegistrationError::Rejected(
                "destination chain equals source chain".to_string(),
            ));
        }

        if intent.sending_asset.is_native() {
            if native_value != intent.amount {
                return Err(RegistrationError::Rejected(format!(
                    "native value {} does not match intent amount {}",
                    native_value, intent.amount
                )));
            }
            self.ledger
                .transfer(&intent.sending_asset, &self.module, &self.custodian, intent.amount)
                .await?;
        } else {
            if !native_value.is_zero() {
                return Err(RegistrationError::Rejected(
                    "native value forwarded with tokenized intent".to_string(),
                ));
            }
            // Pull via the allowance the initiator granted. An allowance
            // short of the amount fails here and the whole call reverts.
            self.ledger
                .transfer_from(
                    &self.custodian,
                    &self.module,
                    &self.custodian,
                    &intent.sending_asset,
                    intent.amount,
                )
                .await?;
        }

        let record = CanonicalTransferRecord {
            protocol_tx_id: Self::fresh_tx_id(),
            sending_asset: intent.sending_asset.clone(),
            amount: intent.amount,
            destination_chain_id: intent.destination.chain_id,
            custodian: self.custodian.clone(),
            registered_at: chrono::Utc::now().timestamp(),
        };
        log::info!(
            "protocol: registered transfer {} of {} {} to chain {}",
            record.protocol_tx_id,
            record.amount,
            record.sending_asset.token_symbol,
            record.destination_chain_id
        );
        Ok(record)
    }
}
