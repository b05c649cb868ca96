// Bridge custody and accounting core: invariant-preserving bookkeeping for
// cross-chain value moves. Custody is only ever authorized by measured
// balance deltas, never by a delegated call's declared effect.

pub mod bridge;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod events;
pub mod ledger;
pub mod protocol;
pub mod swap;

pub mod test_utils; // Shared test utilities

pub use bridge::{BridgeOrchestrator, CrossChainInitiator};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
