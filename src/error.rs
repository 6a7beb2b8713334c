//! Error types for the simulation core

use thiserror::Error;

/// Errors raised by validation, simulation and risk sizing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// An input parameter is outside its allowed range. Raised before any
    /// simulation work starts.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A drawdown statistic used as a divisor is zero, so the risk
    /// suggestion is undefined (e.g. a 100% win rate). The worst-case
    /// values are kept when the maximum drawdown is still positive.
    #[error("risk suggestion undefined: {statistic} drawdown is zero")]
    DegenerateRisk {
        statistic: &'static str,
        max_dd_max: f64,
        risk_suggestion_worst_pct: Option<f64>,
    },

    /// No usable entropy source to seed the run
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// The caller stopped a chunked run between chunks
    #[error("simulation cancelled after {completed} of {total} trials")]
    Cancelled { completed: usize, total: usize },
}

impl RiskError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type RiskResult<T> = std::result::Result<T, RiskError>;
