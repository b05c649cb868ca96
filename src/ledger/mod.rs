pub mod interface;
pub mod simulator;

pub use interface::{AssetLedger, CheckpointId};
pub use simulator::LedgerSimulator;
