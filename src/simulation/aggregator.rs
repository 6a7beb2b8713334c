//! Simulation Aggregator
//!
//! Runs `n_sim` independent trials and collects their statistics into a
//! [`SimulationBatch`]. Trials are executed in chunks; between chunks the
//! caller gets a [`Progress`] update and may stop the run. Within a chunk,
//! trials run either sequentially or on the rayon pool.

use rayon::prelude::*;
use std::ops::{ControlFlow, Range};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::drawdown::max_drawdown;
use super::equity;
use super::generator::{trial_rng, TradeSequenceGenerator};
use super::streak::max_loss_streak;
use crate::config::ExecutionMode;
use crate::error::{RiskError, RiskResult};
use crate::types::{check_positive, RiskParameters, SimulationBatch, TrialStatistics};

/// Default number of trials between progress updates
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Progress of a chunked run, reported after every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Shared flag for stopping a run from another thread or task
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Progress callback that stops the run once the token is cancelled
    pub fn as_progress_check(&self) -> impl FnMut(Progress) -> ControlFlow<()> + '_ {
        move |_| {
            if self.is_cancelled() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }
}

/// Orchestrates the per-trial pipeline: generate -> equity -> drawdown/streak
#[derive(Debug, Clone)]
pub struct SimulationAggregator {
    generator: TradeSequenceGenerator,
    n_sim: usize,
    seed: u64,
    mode: ExecutionMode,
    chunk_size: usize,
}

impl SimulationAggregator {
    pub fn new(
        win_rate: f64,
        reward_ratio: f64,
        n_trades: usize,
        n_sim: usize,
        seed: u64,
    ) -> RiskResult<Self> {
        let generator = TradeSequenceGenerator::new(win_rate, reward_ratio, n_trades)?;
        check_positive("n_sim", n_sim)?;

        Ok(Self {
            generator,
            n_sim,
            seed,
            mode: ExecutionMode::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn from_params(params: &RiskParameters, seed: u64) -> RiskResult<Self> {
        Self::new(
            params.win_rate(),
            params.reward_ratio(),
            params.n_trades(),
            params.n_sim(),
            seed,
        )
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Trials per chunk; 0 is treated as 1
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run every trial to completion
    pub fn run(&self) -> SimulationBatch {
        let start = self.log_start();
        let mut trials = Vec::new();
        for range in self.chunks() {
            self.run_chunk(range, &mut trials);
        }
        self.log_finish(start);
        SimulationBatch::from_trials(&trials)
    }

    /// Run in chunks, calling `on_progress` after each one. Returning
    /// `ControlFlow::Break` stops the run with [`RiskError::Cancelled`];
    /// no partial batch is produced.
    ///
    /// Storage grows one chunk at a time, so an `n_sim` too large to hold
    /// fails with [`RiskError::InvalidParameter`] instead of aborting.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> RiskResult<SimulationBatch>
    where
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        let start = self.log_start();
        let total = self.n_sim;
        let mut trials: Vec<TrialStatistics> = Vec::new();

        for range in self.chunks() {
            let chunk_end = range.end;
            trials.try_reserve(range.len()).map_err(|_| {
                RiskError::invalid(
                    "n_sim",
                    format!("cannot allocate storage for {} trials", total),
                )
            })?;
            self.run_chunk(range, &mut trials);

            let progress = Progress {
                completed: chunk_end,
                total,
            };
            debug!("[{}/{}] trials complete", progress.completed, progress.total);

            if on_progress(progress).is_break() {
                info!("Simulation cancelled after {}/{} trials", chunk_end, total);
                return Err(RiskError::Cancelled {
                    completed: chunk_end,
                    total,
                });
            }
        }

        self.log_finish(start);
        Ok(SimulationBatch::from_trials(&trials))
    }

    /// Consecutive trial index ranges of at most `chunk_size`
    fn chunks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.n_sim)
            .step_by(self.chunk_size)
            .map(move |start| start..start.saturating_add(self.chunk_size).min(self.n_sim))
    }

    fn log_start(&self) -> Instant {
        info!(
            "Simulating {} trials x {} trades (seed {}, {:?})",
            self.n_sim,
            self.generator.n_trades(),
            self.seed,
            self.mode
        );
        Instant::now()
    }

    fn log_finish(&self, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "Completed {} trials in {:.3}s ({:.0} trials/second)",
            self.n_sim,
            elapsed,
            self.n_sim as f64 / elapsed.max(f64::EPSILON)
        );
    }

    fn run_chunk(&self, range: Range<usize>, out: &mut Vec<TrialStatistics>) {
        match self.mode {
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(self.generator.n_trades());
                let mut curve = Vec::with_capacity(self.generator.n_trades());
                for trial in range {
                    let mut rng = trial_rng(self.seed, trial);
                    self.generator.generate_into(&mut rng, &mut outcomes);
                    equity::build_into(&outcomes, &mut curve);
                    out.push(trial_statistics(&outcomes, &curve));
                }
            }
            ExecutionMode::Parallel => {
                let chunk: Vec<TrialStatistics> = range
                    .into_par_iter()
                    .map(|trial| {
                        let outcomes = self.generator.generate(&mut trial_rng(self.seed, trial));
                        let curve = equity::build(&outcomes);
                        trial_statistics(&outcomes, &curve)
                    })
                    .collect();
                out.extend(chunk);
            }
        }
    }
}

/// Sequential run of `n_sim` trials under `seed`
pub fn run(
    win_rate: f64,
    reward_ratio: f64,
    n_trades: usize,
    n_sim: usize,
    seed: u64,
) -> RiskResult<SimulationBatch> {
    Ok(SimulationAggregator::new(win_rate, reward_ratio, n_trades, n_sim, seed)?
        .with_mode(ExecutionMode::Sequential)
        .run())
}

/// Statistics of one trial from its outcomes and their equity curve
pub fn trial_statistics(outcomes: &[f64], curve: &[f64]) -> TrialStatistics {
    TrialStatistics {
        max_drawdown: max_drawdown(curve),
        max_loss_streak: max_loss_streak(outcomes),
        total_profit: curve.last().copied().unwrap_or(0.0),
        avg_winner: mean_where(outcomes, |x| x > 0.0),
        avg_loser: mean_where(outcomes, |x| x < 0.0),
    }
}

fn mean_where(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|&&x| pred(x))
        .fold((0.0, 0usize), |(sum, count), &x| (sum + x, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
