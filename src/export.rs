//! CSV export of per-trial statistics

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::types::SimulationBatch;

#[derive(Serialize)]
struct TrialRow {
    trial: usize,
    max_drawdown: f64,
    max_loss_streak: usize,
    total_profit: f64,
    avg_winner: f64,
    avg_loser: f64,
}

/// One row per trial, with a header line
pub fn write_batch_csv<W: Write>(batch: &SimulationBatch, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for (trial, stats) in batch.trials().enumerate() {
        wtr.serialize(TrialRow {
            trial,
            max_drawdown: stats.max_drawdown,
            max_loss_streak: stats.max_loss_streak,
            total_profit: stats.total_profit,
            avg_winner: stats.avg_winner,
            avg_loser: stats.avg_loser,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_batch_csv_file(batch: &SimulationBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    write_batch_csv(batch, std::io::BufWriter::new(file))?;
    info!("Wrote {} trials to {:?}", batch.len(), path);
    Ok(())
}
