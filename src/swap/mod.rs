pub mod executor;
pub mod types;

pub use executor::{DexSimulator, SwapExecutor};
pub use types::SwapStep;
