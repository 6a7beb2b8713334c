// Library crate - Monte Carlo drawdown simulation and risk sizing

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod histogram;
pub mod simulation;
pub mod sizing;
pub mod types;

// Re-export commonly used types
pub use config::{ExecutionMode, SimulationConfig};
pub use engine::{simulate, simulate_with_progress, validate};
pub use error::{RiskError, RiskResult};
pub use histogram::Histogram;
pub use sizing::{percentile, suggest};
pub use types::*;
