//! Risk Sizing Advisor
//!
//! Turns the simulated max drawdown distribution (in R) and a drawdown
//! tolerance (fraction of equity) into a suggested risk per trade.
//!
//! Percentiles use linear interpolation between order statistics: for
//! `n` sorted samples and quantile `q`, `h = (n - 1) * q` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
//! This is the "linear" (Hyndman-Fan type 7) rule.

use tracing::{debug, warn};

use crate::error::{RiskError, RiskResult};
use crate::types::RiskSummary;

/// Quantile of the drawdown distribution used for the main suggestion
pub const RISK_QUANTILE: f64 = 0.95;

/// `q`-quantile of `samples`, linear interpolation. `q` in [0, 1].
pub fn percentile(samples: &[f64], q: f64) -> RiskResult<f64> {
    if samples.is_empty() {
        return Err(RiskError::invalid("samples", "distribution is empty"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(RiskError::invalid(
            "quantile",
            format!("must be within [0, 1], got {}", q),
        ));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(percentile_sorted(&sorted, q))
}

fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Suggested risk per trade for a drawdown tolerance
///
/// `risk_suggestion_pct = max_dd_limit / perc95 * 100` and the same against
/// the worst simulated drawdown. A zero divisor is reported as
/// [`RiskError::DegenerateRisk`], which still carries the worst-case
/// suggestion when only the 95th percentile is zero.
pub fn suggest(max_dd_limit: f64, max_dds: &[f64]) -> RiskResult<RiskSummary> {
    if !max_dd_limit.is_finite() || max_dd_limit <= 0.0 || max_dd_limit > 1.0 {
        return Err(RiskError::invalid(
            "max_dd_limit",
            format!("must be within (0, 1], got {}", max_dd_limit),
        ));
    }
    if max_dds.iter().any(|x| !x.is_finite() || *x < 0.0) {
        return Err(RiskError::invalid(
            "max_dds",
            "drawdowns must be finite and non-negative",
        ));
    }

    let perc95_max_dd = percentile(max_dds, RISK_QUANTILE)?;
    let max_dd_max = max_dds.iter().copied().fold(0.0, f64::max);

    if max_dd_max == 0.0 {
        warn!("No simulated drawdown, risk suggestion undefined");
        return Err(RiskError::DegenerateRisk {
            statistic: "95th percentile",
            max_dd_max,
            risk_suggestion_worst_pct: None,
        });
    }
    if perc95_max_dd == 0.0 {
        warn!("95th percentile drawdown is zero, only the worst case is defined");
        return Err(RiskError::DegenerateRisk {
            statistic: "95th percentile",
            max_dd_max,
            risk_suggestion_worst_pct: Some(max_dd_limit / max_dd_max * 100.0),
        });
    }

    let summary = RiskSummary {
        perc95_max_dd,
        max_dd_max,
        risk_suggestion_pct: max_dd_limit / perc95_max_dd * 100.0,
        risk_suggestion_worst_pct: max_dd_limit / max_dd_max * 100.0,
    };

    debug!(
        "p95 DD {:.2}R, worst {:.2}R -> risk {:.3}% (worst-case {:.3}%)",
        summary.perc95_max_dd,
        summary.max_dd_max,
        summary.risk_suggestion_pct,
        summary.risk_suggestion_worst_pct
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let samples = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert!((percentile(&samples, 0.95).unwrap() - 4.8).abs() < 1e-12);
        assert_eq!(percentile(&samples, 0.5).unwrap(), 3.0);
        assert_eq!(percentile(&samples, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&samples, 1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_percentile_on_grid() {
        let samples: Vec<f64> = (0..=100).map(f64::from).collect();
        assert!((percentile(&samples, 0.95).unwrap() - 95.0).abs() < 1e-9);
        assert_eq!(percentile(&[7.0], 0.95).unwrap(), 7.0);
    }

    #[test]
    fn test_percentile_rejects_bad_input() {
        assert!(percentile(&[], 0.5).is_err());
        assert!(percentile(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_suggestion() {
        // p95 of 1..=5 is 4.8, worst is 5
        let summary = suggest(0.24, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((summary.perc95_max_dd - 4.8).abs() < 1e-12);
        assert_eq!(summary.max_dd_max, 5.0);
        assert!((summary.risk_suggestion_pct - 5.0).abs() < 1e-9);
        assert!((summary.risk_suggestion_worst_pct - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_drawdowns_are_degenerate() {
        let err = suggest(0.1, &[0.0; 100]).unwrap_err();
        assert_eq!(
            err,
            RiskError::DegenerateRisk {
                statistic: "95th percentile",
                max_dd_max: 0.0,
                risk_suggestion_worst_pct: None,
            }
        );
    }

    #[test]
    fn test_rare_drawdown_only_worst_defined() {
        // 1 in 100 trials has a drawdown; p95 is still 0
        let mut max_dds = vec![0.0; 99];
        max_dds.push(3.0);
        let err = suggest(0.1, &max_dds).unwrap_err();
        assert_eq!(
            err,
            RiskError::DegenerateRisk {
                statistic: "95th percentile",
                max_dd_max: 3.0,
                risk_suggestion_worst_pct: Some(0.1 / 3.0 * 100.0),
            }
        );
    }

    #[test]
    fn test_rejects_bad_limit() {
        assert!(matches!(
            suggest(0.0, &[1.0]),
            Err(RiskError::InvalidParameter { name: "max_dd_limit", .. })
        ));
        assert!(matches!(
            suggest(1.5, &[1.0]),
            Err(RiskError::InvalidParameter { name: "max_dd_limit", .. })
        ));
    }
}
