//! Maximum drawdown of an equity curve
//!
//! Absolute drawdown in R, not percent: the running peak starts at the
//! first point of the curve, so a curve that opens with losses only
//! counts the decline after the first trade.

/// Largest `peak - point` seen along the curve. Empty or single-point
/// curves yield 0.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0f64;

    for &point in &curve[1..] {
        peak = peak.max(point);
        max_dd = max_dd.max(peak - point);
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_curve() {
        // peak 3 -> trough -1
        let curve = [1.0, 3.0, 2.0, -1.0, 0.0, 2.5];
        assert_eq!(max_drawdown(&curve), 4.0);
    }

    #[test]
    fn test_peak_starts_at_first_point() {
        assert_eq!(max_drawdown(&[-1.0, -2.0, -3.0]), 2.0);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(max_drawdown(&[-5.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_later_peak_resets() {
        // 2 from the first peak, then 5 from the higher one
        let curve = [0.0, 2.0, 0.0, 6.0, 1.0, 3.0];
        assert_eq!(max_drawdown(&curve), 5.0);
    }

    proptest! {
        #[test]
        fn prop_non_negative(curve in prop::collection::vec(-100.0f64..100.0, 1..200)) {
            prop_assert!(max_drawdown(&curve) >= 0.0);
        }

        #[test]
        fn prop_zero_iff_non_decreasing(curve in prop::collection::vec(-100.0f64..100.0, 1..50)) {
            let non_decreasing = curve.windows(2).all(|w| w[1] >= w[0]);
            prop_assert_eq!(max_drawdown(&curve) == 0.0, non_decreasing);
        }

        #[test]
        fn prop_sorted_curve_has_no_drawdown(mut curve in prop::collection::vec(-100.0f64..100.0, 1..50)) {
            curve.sort_by(f64::total_cmp);
            prop_assert_eq!(max_drawdown(&curve), 0.0);
        }
    }
}
