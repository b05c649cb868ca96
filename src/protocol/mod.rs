pub mod interface;
pub mod simulator;

pub use interface::TransactionManager;
pub use simulator::TransactionManagerSim;
