pub mod initiator;
pub mod orchestrator;
pub mod types;

pub use initiator::CrossChainInitiator;
pub use orchestrator::BridgeOrchestrator;
