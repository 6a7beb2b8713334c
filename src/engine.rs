//! Two-phase entry point: `validate` raw input, then `simulate`
//!
//! Stateless: a report depends only on the parameters and the seed, so
//! replaying `report.seed` reproduces it exactly.

use std::ops::ControlFlow;
use tracing::info;
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::error::RiskResult;
use crate::histogram::Histogram;
use crate::simulation::{entropy_seed, Progress, SimulationAggregator};
use crate::sizing::suggest;
use crate::types::{RiskInput, RiskParameters, SimulationBatch, SimulationReport};

/// Check raw input and convert it to simulation parameters
pub fn validate(input: &RiskInput) -> RiskResult<RiskParameters> {
    input.validate()
}

/// Run the full pipeline to completion
pub fn simulate(params: &RiskParameters, config: &SimulationConfig) -> RiskResult<SimulationReport> {
    simulate_with_progress(params, config, |_| ControlFlow::Continue(()))
}

/// Run the full pipeline, reporting progress between chunks of trials
pub fn simulate_with_progress<F>(
    params: &RiskParameters,
    config: &SimulationConfig,
    on_progress: F,
) -> RiskResult<SimulationReport>
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    let run_id = Uuid::new_v4();
    let seed = resolve_seed(config)?;

    info!(
        "Run {}: WR {:.1}%, R {:.2}, {} trades x {} sims, DD limit {:.1}%",
        run_id,
        params.win_rate() * 100.0,
        params.reward_ratio(),
        params.n_trades(),
        params.n_sim(),
        params.max_dd_limit() * 100.0
    );

    let batch = run_batch(params, config, seed, on_progress)?;
    let summary = suggest(params.max_dd_limit(), batch.max_dds())?;
    let histogram = Histogram::from_samples(batch.max_dds(), config.histogram_bins)?;

    info!(
        "Run {}: p95 DD {:.2}R, worst {:.2}R, risk {:.3}% (worst-case {:.3}%)",
        run_id,
        summary.perc95_max_dd,
        summary.max_dd_max,
        summary.risk_suggestion_pct,
        summary.risk_suggestion_worst_pct
    );

    Ok(SimulationReport {
        run_id,
        seed,
        parameters: *params,
        summary,
        histogram,
        batch,
        generated_at: chrono::Utc::now(),
    })
}

/// Only the per-trial batch, without risk sizing
pub fn run_batch<F>(
    params: &RiskParameters,
    config: &SimulationConfig,
    seed: u64,
    on_progress: F,
) -> RiskResult<SimulationBatch>
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    SimulationAggregator::from_params(params, seed)?
        .with_mode(config.mode)
        .with_chunk_size(config.chunk_size)
        .run_with_progress(on_progress)
}

/// Configured seed, or a fresh one from OS entropy
pub fn resolve_seed(config: &SimulationConfig) -> RiskResult<u64> {
    match config.seed {
        Some(seed) => Ok(seed),
        None => entropy_seed(),
    }
}
