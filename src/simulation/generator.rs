//! Trade sequence generation
//!
//! Each trade is an independent Bernoulli draw: `+reward_ratio` with
//! probability `win_rate`, otherwise a fixed `-1` (one R lost).
//!
//! Randomness is always passed in. Trials use [`trial_rng`], which gives
//! trial `i` its own ChaCha8 stream under a shared base seed, so a batch
//! is bit-for-bit identical whether trials run sequentially or on rayon.

use rand::rngs::OsRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::error::{RiskError, RiskResult};
use crate::types::{check_positive, check_reward_ratio, check_win_rate};

/// Outcome of a losing trade, in R
pub const LOSS: f64 = -1.0;

/// Draws sequences of independent trade outcomes
#[derive(Debug, Clone, Copy)]
pub struct TradeSequenceGenerator {
    win: Bernoulli,
    reward_ratio: f64,
    n_trades: usize,
}

impl TradeSequenceGenerator {
    pub fn new(win_rate: f64, reward_ratio: f64, n_trades: usize) -> RiskResult<Self> {
        check_win_rate(win_rate)?;
        check_reward_ratio(reward_ratio)?;
        check_positive("n_trades", n_trades)?;

        let win = Bernoulli::new(win_rate)
            .map_err(|e| RiskError::invalid("win_rate", e.to_string()))?;

        Ok(Self {
            win,
            reward_ratio,
            n_trades,
        })
    }

    pub fn n_trades(&self) -> usize {
        self.n_trades
    }

    /// Draw one full sequence of `n_trades` outcomes
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mut outcomes = Vec::with_capacity(self.n_trades);
        self.generate_into(rng, &mut outcomes);
        outcomes
    }

    /// Same as [`generate`](Self::generate) but reuses `buf`
    pub fn generate_into<R: Rng + ?Sized>(&self, rng: &mut R, buf: &mut Vec<f64>) {
        buf.clear();
        buf.reserve(self.n_trades);
        for _ in 0..self.n_trades {
            let outcome = if self.win.sample(rng) {
                self.reward_ratio
            } else {
                LOSS
            };
            buf.push(outcome);
        }
    }
}

/// One-shot generation with an explicit randomness source
pub fn generate<R: Rng + ?Sized>(
    win_rate: f64,
    reward_ratio: f64,
    n_trades: usize,
    rng: &mut R,
) -> RiskResult<Vec<f64>> {
    Ok(TradeSequenceGenerator::new(win_rate, reward_ratio, n_trades)?.generate(rng))
}

/// Independent random stream for trial `trial` under `seed`
pub fn trial_rng(seed: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial as u64);
    rng
}

/// Fresh base seed from the operating system's entropy source
pub fn entropy_seed() -> RiskResult<u64> {
    let mut bytes = [0u8; 8];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RiskError::RandomnessUnavailable(e.to_string()))?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_length_and_values() {
        let generator = TradeSequenceGenerator::new(0.4, 2.5, 250).unwrap();
        let outcomes = generator.generate(&mut trial_rng(7, 0));

        assert_eq!(outcomes.len(), 250);
        assert!(outcomes.iter().all(|&x| x == 2.5 || x == LOSS));
    }

    #[test]
    fn test_extreme_win_rates() {
        let mut rng = trial_rng(1, 0);
        let all_wins = generate(1.0, 3.0, 50, &mut rng).unwrap();
        assert!(all_wins.iter().all(|&x| x == 3.0));

        let all_losses = generate(0.0, 3.0, 50, &mut rng).unwrap();
        assert!(all_losses.iter().all(|&x| x == LOSS));
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            TradeSequenceGenerator::new(1.01, 1.0, 10),
            Err(RiskError::InvalidParameter { name: "win_rate", .. })
        ));
        assert!(matches!(
            TradeSequenceGenerator::new(-0.1, 1.0, 10),
            Err(RiskError::InvalidParameter { name: "win_rate", .. })
        ));
        assert!(matches!(
            TradeSequenceGenerator::new(0.5, 1.0, 0),
            Err(RiskError::InvalidParameter { name: "n_trades", .. })
        ));
        assert!(matches!(
            TradeSequenceGenerator::new(0.5, -2.0, 10),
            Err(RiskError::InvalidParameter { name: "reward_ratio", .. })
        ));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let generator = TradeSequenceGenerator::new(0.5, 1.0, 100).unwrap();
        let a = generator.generate(&mut trial_rng(42, 3));
        let b = generator.generate(&mut trial_rng(42, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_trial_streams_differ() {
        let generator = TradeSequenceGenerator::new(0.5, 1.0, 200).unwrap();
        let a = generator.generate(&mut trial_rng(42, 0));
        let b = generator.generate(&mut trial_rng(42, 1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_win_frequency_tracks_win_rate() {
        let generator = TradeSequenceGenerator::new(0.3, 1.0, 20_000).unwrap();
        let outcomes = generator.generate(&mut trial_rng(11, 0));
        let wins = outcomes.iter().filter(|&&x| x > 0.0).count() as f64;
        let freq = wins / outcomes.len() as f64;
        assert!((freq - 0.3).abs() < 0.02, "win frequency {}", freq);
    }

    #[test]
    fn test_generate_into_reuses_buffer() {
        let generator = TradeSequenceGenerator::new(0.5, 1.0, 10).unwrap();
        let mut buf = vec![9.0; 40];
        generator.generate_into(&mut trial_rng(5, 0), &mut buf);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf, generator.generate(&mut trial_rng(5, 0)));
    }

    #[test]
    fn test_entropy_seed() {
        assert!(entropy_seed().is_ok());
    }
}
