//! Histogram binning of the max drawdown distribution
//!
//! The core never renders images; a presentation layer draws these bins.

use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Default bin count for drawdown histograms
pub const DEFAULT_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Equal-width bins over [min, max]. Bins are half-open except the last,
    /// which includes `max`. When every sample has the same value `v` the
    /// range widens to [v - 0.5, v + 0.5]; no samples gives [0, 1].
    pub fn from_samples(samples: &[f64], bins: usize) -> RiskResult<Self> {
        if bins == 0 {
            return Err(RiskError::invalid("histogram_bins", "must be at least 1"));
        }
        if samples.iter().any(|x| !x.is_finite()) {
            return Err(RiskError::invalid("samples", "must be finite"));
        }

        let (mut lo, mut hi) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        if samples.is_empty() {
            (lo, hi) = (0.0, 1.0);
        } else if lo == hi {
            (lo, hi) = (lo - 0.5, hi + 0.5);
        }

        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &x in samples {
            let idx = (((x - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: lo + width * i as f64,
                upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
                count,
            })
            .collect();

        Ok(Self { bins })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Bin with the most samples (first one on ties)
    pub fn mode(&self) -> Option<&HistogramBin> {
        self.bins
            .iter()
            .fold(None, |best: Option<&HistogramBin>, bin| match best {
                Some(b) if b.count >= bin.count => Some(b),
                _ => Some(bin),
            })
    }
}
