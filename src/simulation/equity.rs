//! Equity curve construction

/// Cumulative sum of outcomes: `curve[i] = outcomes[0] + ... + outcomes[i]`
pub fn build(outcomes: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(outcomes.len());
    build_into(outcomes, &mut curve);
    curve
}

/// Same as [`build`] but reuses `curve`
pub fn build_into(outcomes: &[f64], curve: &mut Vec<f64>) {
    curve.clear();
    curve.extend(outcomes.iter().scan(0.0, |equity, &x| {
        *equity += x;
        Some(*equity)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_sum() {
        assert_eq!(build(&[2.0, -1.0, -1.0, 2.0]), vec![2.0, 1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_length_matches() {
        assert!(build(&[]).is_empty());
        assert_eq!(build(&[-1.0]), vec![-1.0]);
        assert_eq!(build(&[1.5; 37]).len(), 37);
    }
}
