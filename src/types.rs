//! Shared data types for the drawdown simulation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RiskError, RiskResult};
use crate::histogram::Histogram;

/// Raw user input, percentages as entered on a form or CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    /// Win rate in percent, 0..=100
    pub win_rate_pct: f64,
    /// Payoff of a winner as a multiple of the fixed 1R loss
    pub reward_ratio: f64,
    /// Trades per simulated sequence
    pub n_trades: i64,
    /// Number of simulated sequences
    pub n_sim: i64,
    /// Tolerated max drawdown in percent of equity, (0, 100]
    pub max_dd_limit_pct: f64,
}

impl RiskInput {
    /// Convert percentages to fractions and check every bound
    pub fn validate(&self) -> RiskResult<RiskParameters> {
        let n_trades = check_count("n_trades", self.n_trades)?;
        let n_sim = check_count("n_sim", self.n_sim)?;
        RiskParameters::new(
            self.win_rate_pct / 100.0,
            self.reward_ratio,
            n_trades,
            n_sim,
            self.max_dd_limit_pct / 100.0,
        )
    }
}

/// Validated simulation parameters. Only constructible through validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskParameters {
    win_rate: f64,
    reward_ratio: f64,
    n_trades: usize,
    n_sim: usize,
    max_dd_limit: f64,
}

impl RiskParameters {
    /// Build from fractional values (win_rate in [0,1], max_dd_limit in (0,1])
    pub fn new(
        win_rate: f64,
        reward_ratio: f64,
        n_trades: usize,
        n_sim: usize,
        max_dd_limit: f64,
    ) -> RiskResult<Self> {
        check_win_rate(win_rate)?;
        check_reward_ratio(reward_ratio)?;
        check_positive("n_trades", n_trades)?;
        check_positive("n_sim", n_sim)?;
        if !max_dd_limit.is_finite() || max_dd_limit <= 0.0 || max_dd_limit > 1.0 {
            return Err(RiskError::invalid(
                "max_dd_limit",
                format!("must be within (0, 1], got {}", max_dd_limit),
            ));
        }

        Ok(Self {
            win_rate,
            reward_ratio,
            n_trades,
            n_sim,
            max_dd_limit,
        })
    }

    pub fn win_rate(&self) -> f64 {
        self.win_rate
    }

    pub fn reward_ratio(&self) -> f64 {
        self.reward_ratio
    }

    pub fn n_trades(&self) -> usize {
        self.n_trades
    }

    pub fn n_sim(&self) -> usize {
        self.n_sim
    }

    pub fn max_dd_limit(&self) -> f64 {
        self.max_dd_limit
    }
}

pub(crate) fn check_win_rate(win_rate: f64) -> RiskResult<()> {
    if !(0.0..=1.0).contains(&win_rate) {
        return Err(RiskError::invalid(
            "win_rate",
            format!("must be within [0, 1], got {}", win_rate),
        ));
    }
    Ok(())
}

pub(crate) fn check_reward_ratio(reward_ratio: f64) -> RiskResult<()> {
    if !reward_ratio.is_finite() || reward_ratio <= 0.0 {
        return Err(RiskError::invalid(
            "reward_ratio",
            format!("must be a positive finite number, got {}", reward_ratio),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(name: &'static str, value: usize) -> RiskResult<()> {
    if value == 0 {
        return Err(RiskError::invalid(name, "must be at least 1"));
    }
    Ok(())
}

fn check_count(name: &'static str, value: i64) -> RiskResult<usize> {
    if value <= 0 {
        return Err(RiskError::invalid(
            name,
            format!("must be at least 1, got {}", value),
        ));
    }
    usize::try_from(value).map_err(|_| RiskError::invalid(name, "too large for this platform"))
}

/// Statistics of a single simulated trade sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialStatistics {
    /// Largest peak-to-current decline, in R
    pub max_drawdown: f64,
    /// Longest run of consecutive losers
    pub max_loss_streak: usize,
    /// Final equity value, in R
    pub total_profit: f64,
    /// Mean of winning outcomes, 0 if there were none
    pub avg_winner: f64,
    /// Mean of losing outcomes, 0 if there were none
    pub avg_loser: f64,
}

/// Per-trial statistics collected into aligned arrays, one element per trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationBatch {
    max_dds: Vec<f64>,
    max_streaks: Vec<usize>,
    total_profits: Vec<f64>,
    avg_winners: Vec<f64>,
    avg_losers: Vec<f64>,
}

impl SimulationBatch {
    pub fn from_trials(trials: &[TrialStatistics]) -> Self {
        Self {
            max_dds: trials.iter().map(|t| t.max_drawdown).collect(),
            max_streaks: trials.iter().map(|t| t.max_loss_streak).collect(),
            total_profits: trials.iter().map(|t| t.total_profit).collect(),
            avg_winners: trials.iter().map(|t| t.avg_winner).collect(),
            avg_losers: trials.iter().map(|t| t.avg_loser).collect(),
        }
    }

    /// Number of trials
    pub fn len(&self) -> usize {
        self.max_dds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_dds.is_empty()
    }

    pub fn max_dds(&self) -> &[f64] {
        &self.max_dds
    }

    pub fn max_streaks(&self) -> &[usize] {
        &self.max_streaks
    }

    pub fn total_profits(&self) -> &[f64] {
        &self.total_profits
    }

    pub fn avg_winners(&self) -> &[f64] {
        &self.avg_winners
    }

    pub fn avg_losers(&self) -> &[f64] {
        &self.avg_losers
    }

    /// Statistics of trial `i`, if it exists
    pub fn trial(&self, i: usize) -> Option<TrialStatistics> {
        Some(TrialStatistics {
            max_drawdown: *self.max_dds.get(i)?,
            max_loss_streak: *self.max_streaks.get(i)?,
            total_profit: *self.total_profits.get(i)?,
            avg_winner: *self.avg_winners.get(i)?,
            avg_loser: *self.avg_losers.get(i)?,
        })
    }

    pub fn trials(&self) -> impl Iterator<Item = TrialStatistics> + '_ {
        (0..self.len()).filter_map(|i| self.trial(i))
    }
}

/// Final risk sizing output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// 95th percentile of the max drawdown distribution, in R
    pub perc95_max_dd: f64,
    /// Worst simulated max drawdown, in R
    pub max_dd_max: f64,
    /// Risk per trade (percent of equity) keeping the 95th percentile drawdown within the limit
    pub risk_suggestion_pct: f64,
    /// Risk per trade (percent of equity) keeping the worst drawdown within the limit
    pub risk_suggestion_worst_pct: f64,
}

/// Everything a presentation layer needs from one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    /// Base seed the run used; replaying with it reproduces the batch
    pub seed: u64,
    pub parameters: RiskParameters,
    pub summary: RiskSummary,
    pub histogram: Histogram,
    pub batch: SimulationBatch,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl SimulationReport {
    /// Raw max drawdown distribution for external plotting
    pub fn max_dds(&self) -> &[f64] {
        self.batch.max_dds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RiskInput {
        RiskInput {
            win_rate_pct: 55.0,
            reward_ratio: 1.5,
            n_trades: 100,
            n_sim: 500,
            max_dd_limit_pct: 20.0,
        }
    }

    #[test]
    fn test_validate_converts_percentages() {
        let params = input().validate().unwrap();
        assert!((params.win_rate() - 0.55).abs() < 1e-12);
        assert!((params.max_dd_limit() - 0.20).abs() < 1e-12);
        assert_eq!(params.n_trades(), 100);
        assert_eq!(params.n_sim(), 500);
        assert_eq!(params.reward_ratio(), 1.5);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            RiskInput { win_rate_pct: 100.5, ..input() },
            RiskInput { win_rate_pct: -1.0, ..input() },
            RiskInput { win_rate_pct: f64::NAN, ..input() },
            RiskInput { reward_ratio: 0.0, ..input() },
            RiskInput { reward_ratio: f64::INFINITY, ..input() },
            RiskInput { n_trades: 0, ..input() },
            RiskInput { n_sim: -5, ..input() },
            RiskInput { max_dd_limit_pct: 0.0, ..input() },
            RiskInput { max_dd_limit_pct: 150.0, ..input() },
        ];

        for case in cases {
            assert!(
                matches!(case.validate(), Err(RiskError::InvalidParameter { .. })),
                "accepted {:?}",
                case
            );
        }
    }

    #[test]
    fn test_validate_names_offending_parameter() {
        let err = RiskInput { n_sim: 0, ..input() }.validate().unwrap_err();
        assert!(matches!(err, RiskError::InvalidParameter { name: "n_sim", .. }));
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(RiskInput { win_rate_pct: 0.0, ..input() }.validate().is_ok());
        assert!(RiskInput { win_rate_pct: 100.0, ..input() }.validate().is_ok());
        assert!(RiskInput { max_dd_limit_pct: 100.0, ..input() }.validate().is_ok());
    }

    #[test]
    fn test_batch_arrays_aligned() {
        let trials = vec![
            TrialStatistics {
                max_drawdown: 3.0,
                max_loss_streak: 3,
                total_profit: 2.0,
                avg_winner: 2.0,
                avg_loser: -1.0,
            },
            TrialStatistics {
                max_drawdown: 0.0,
                max_loss_streak: 0,
                total_profit: 10.0,
                avg_winner: 2.0,
                avg_loser: 0.0,
            },
        ];
        let batch = SimulationBatch::from_trials(&trials);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.max_dds(), &[3.0, 0.0]);
        assert_eq!(batch.max_streaks(), &[3, 0]);
        assert_eq!(batch.total_profits(), &[2.0, 10.0]);
        assert_eq!(batch.avg_winners(), &[2.0, 2.0]);
        assert_eq!(batch.avg_losers(), &[-1.0, 0.0]);
        assert_eq!(batch.trials().collect::<Vec<_>>(), trials);
        assert_eq!(batch.trial(2), None);
    }
}
