//! Simulation Core - Monte Carlo trade sequence simulation
//!
//! - Trade outcome generation (seeded, one stream per trial)
//! - Equity curve construction
//! - Max drawdown and max loss streak analysis
//! - Batch aggregation across trials (sequential, rayon, chunked)

pub mod aggregator;
pub mod drawdown;
pub mod equity;
pub mod generator;
pub mod streak;

// Re-export commonly used items
pub use aggregator::{run, CancelToken, Progress, SimulationAggregator, DEFAULT_CHUNK_SIZE};
pub use drawdown::max_drawdown;
pub use generator::{entropy_seed, generate, trial_rng, TradeSequenceGenerator};
pub use streak::max_loss_streak;
