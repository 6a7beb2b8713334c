//! Longest run of consecutive losing trades

/// Strictly negative outcomes extend the streak; anything else,
/// including a scratch trade of exactly 0, resets it.
pub fn max_loss_streak(outcomes: &[f64]) -> usize {
    let mut current = 0usize;
    let mut max_streak = 0usize;

    for &x in outcomes {
        if x < 0.0 {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }

    max_streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_longest_run() {
        let outcomes = [-1.0, -1.0, 2.0, -1.0, -1.0, -1.0, 2.0, -1.0];
        assert_eq!(max_loss_streak(&outcomes), 3);
    }

    #[test]
    fn test_zero_resets() {
        assert_eq!(max_loss_streak(&[-1.0, -1.0, 0.0, -1.0]), 2);
    }

    #[test]
    fn test_all_losses() {
        assert_eq!(max_loss_streak(&[-1.0; 12]), 12);
        assert_eq!(max_loss_streak(&[]), 0);
    }

    proptest! {
        #[test]
        fn prop_no_losses_no_streak(outcomes in prop::collection::vec(0.0f64..10.0, 0..100)) {
            prop_assert_eq!(max_loss_streak(&outcomes), 0);
        }

        #[test]
        fn prop_bounded_by_length(outcomes in prop::collection::vec(-5.0f64..5.0, 0..100)) {
            let streak = max_loss_streak(&outcomes);
            prop_assert!(streak <= outcomes.len());
            prop_assert!(streak <= outcomes.iter().filter(|&&x| x < 0.0).count());
        }
    }
}
