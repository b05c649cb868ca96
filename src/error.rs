// Error taxonomy for the bridge custody core.
//
// Every error aborts the whole entry-point call atomically. Nothing is
// caught, retried, or downgraded inside the core; collaborator errors are
// wrapped via #[from] so they surface to the caller unmodified.

use crate::data_structures::{AccountId, AssetId};
use ethers::types::U256;
use thiserror::Error;

/// Failures reported by the asset transfer primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {} for {}: have {have}, need {need}", .asset.token_symbol, .account.address)]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        have: U256,
        need: U256,
    },

    #[error("insufficient allowance of {} from {} to {spender}: have {have}, need {need}", .asset.token_symbol, .owner.address)]
    InsufficientAllowance {
        owner: AccountId,
        spender: String,
        asset: AssetId,
        have: U256,
        need: U256,
    },

    #[error("transfer of {} rejected: {reason}", .asset.token_symbol)]
    TransferRejected { asset: AssetId, reason: String },

    #[error("unknown ledger checkpoint {0}")]
    UnknownCheckpoint(u64),
}

/// Failures reported by the swap executor. Propagated verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("no route from {} to {}", .input.token_symbol, .output.token_symbol)]
    UnsupportedPair { input: AssetId, output: AssetId },

    #[error("swap execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Failures reported by the external transaction-management protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("external protocol rejected the transfer intent: {0}")]
    Rejected(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Main error type for the bridge orchestration core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Measured balance delta does not match the claimed or required amount.
    #[error("invalid amount: expected {expected}, measured {measured}")]
    InvalidAmount { expected: U256, measured: U256 },

    /// Native value attached to a completion call does not equal the amount.
    #[error("invalid native amount: expected {expected}, attached {attached}")]
    InvalidNativeAmount { expected: U256, attached: U256 },

    /// Native value attached to a call for a tokenized asset.
    #[error("unexpected native value attached: {attached}")]
    UnexpectedNativeValue { attached: U256 },

    #[error("asset transfer failed: {0}")]
    AssetTransferFailed(#[from] LedgerError),

    #[error("swap failed: {0}")]
    SwapFailed(#[from] SwapError),

    #[error("registration rejected: {0}")]
    RegistrationRejected(#[from] RegistrationError),

    /// An entry point was re-invoked while another call was in flight.
    #[error("reentrant call into bridge entry point")]
    ReentrantCall,
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_error_wraps_ledger_error_transparently() {
        let asset = AssetId::token(1, "TOK", "0xtok");
        let account = AccountId::new(1, "mod");
        let ledger_err = LedgerError::InsufficientBalance {
            account,
            asset,
            have: U256::zero(),
            need: U256::from(100),
        };
        let swap_err: SwapError = ledger_err.clone().into();
        // Transparent wrapping keeps the underlying message intact.
        assert_eq!(swap_err.to_string(), ledger_err.to_string());

        let bridge_err: BridgeError = swap_err.into();
        assert!(matches!(bridge_err, BridgeError::SwapFailed(_)));
    }

    #[test]
    fn invalid_amount_reports_both_sides() {
        let err = BridgeError::InvalidAmount {
            expected: U256::from(100),
            measured: U256::from(97),
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("97"));
    }
}
