//! Configuration for simulation runs

use serde::{Deserialize, Serialize};

use crate::histogram::DEFAULT_BINS;
use crate::simulation::DEFAULT_CHUNK_SIZE;

/// How trials inside a chunk are executed. Both modes produce identical
/// batches for the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One trial after another on the calling thread
    Sequential,
    /// Trials spread over the rayon thread pool
    Parallel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Parallel
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "parallel" | "par" => Ok(Self::Parallel),
            other => Err(format!("unknown execution mode: {}", other)),
        }
    }
}

/// Settings that control how a simulation runs, not what it simulates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed; `None` draws one from OS entropy
    pub seed: Option<u64>,

    /// Sequential or rayon-parallel trial execution
    pub mode: ExecutionMode,

    /// Trials per chunk between progress/cancellation checks
    pub chunk_size: usize,

    /// Bins in the drawdown histogram
    pub histogram_bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            mode: ExecutionMode::Parallel,
            chunk_size: DEFAULT_CHUNK_SIZE,
            histogram_bins: DEFAULT_BINS,
        }
    }
}

impl SimulationConfig {
    /// Reproducible config with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }
}
