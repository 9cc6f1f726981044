//! crates/cardforge_core/src/rewards/spin.rs
//!
//! Weighted-random draws from the spin wheel.

use std::sync::Arc;
use tracing::debug;

use super::catalog::RewardCatalog;
use crate::domain::{SpinOutcome, SpinRewardType};
use crate::ports::{Clock, RandomSource};

/// Linear cumulative scan: the first index whose running sum exceeds `u * total`.
///
/// Falls back to the last positive weight when rounding leaves the target at
/// the very top of the range. Returns `None` only when no weight is positive.
pub(crate) fn weighted_index(weights: &[f64], u: f64) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let target = u.clamp(0.0, 1.0) * total;

    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > target {
            return Some(index);
        }
    }
    weights.iter().rposition(|weight| *weight > 0.0)
}

/// Uniform inclusive draw from `[min, max]`.
pub(crate) fn uniform_amount(min: u32, max: u32, u: f64) -> u32 {
    let span = u64::from(max - min) + 1;
    let offset = ((u.clamp(0.0, 1.0) * span as f64).floor() as u64).min(span - 1);
    min + offset as u32
}

pub struct SpinEngine {
    catalog: Arc<RewardCatalog>,
    random: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl SpinEngine {
    pub fn new(catalog: Arc<RewardCatalog>, random: Box<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            random,
            clock,
        }
    }

    /// Draws one reward. `streak_day` is recorded on the outcome, floored at 1.
    pub fn draw(&mut self, streak_day: u32) -> SpinOutcome {
        let entries = self.catalog.spin_rewards();
        let weights: Vec<f64> = entries.iter().map(|entry| entry.weight).collect();

        // The catalog guarantees a positive total weight.
        let index = weighted_index(&weights, self.random.next_uniform()).unwrap_or(0);
        let entry = &entries[index];
        let amount = uniform_amount(entry.min_amount, entry.max_amount, self.random.next_uniform());

        let bonus_gems = match entry.reward_type {
            SpinRewardType::Jackpot => self.catalog.jackpot_bonus_gems(),
            _ => 0,
        };

        debug!(reward = ?entry.reward_type, amount, bonus_gems, "Spin drawn.");

        SpinOutcome {
            reward_type: entry.reward_type,
            amount,
            bonus_gems,
            streak_day_at_spin: streak_day.max(1),
            timestamp: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StreakMilestone;
    use crate::test_support::{FixedClock, SeededRandom, SequenceRandom};
    use std::collections::HashMap;

    fn engine(random: impl RandomSource + 'static) -> SpinEngine {
        SpinEngine::new(
            Arc::new(RewardCatalog::standard()),
            Box::new(random),
            Arc::new(FixedClock::on(2026, 3, 14)),
        )
    }

    #[test]
    fn fixed_sample_selects_by_cumulative_weight() {
        // Energy covers [0, 40), Coins [40, 70): 0.41 * 100 = 41 lands on Coins.
        let outcome = engine(SequenceRandom::constant(0.41)).draw(1);
        assert_eq!(outcome.reward_type, SpinRewardType::Coins);
        assert_eq!(outcome.bonus_gems, 0);
    }

    #[test]
    fn boundaries_pick_first_and_last_slices() {
        assert_eq!(engine(SequenceRandom::constant(0.0)).draw(1).reward_type, SpinRewardType::Energy);
        assert_eq!(engine(SequenceRandom::constant(0.3999)).draw(1).reward_type, SpinRewardType::Energy);
        assert_eq!(engine(SequenceRandom::constant(0.40)).draw(1).reward_type, SpinRewardType::Coins);
        assert_eq!(
            engine(SequenceRandom::constant(0.999_999)).draw(1).reward_type,
            SpinRewardType::Jackpot
        );
    }

    #[test]
    fn zero_weight_slices_are_never_selected() {
        assert_eq!(weighted_index(&[0.0, 5.0, 0.0], 0.0), Some(1));
        assert_eq!(weighted_index(&[0.0, 5.0, 0.0], 0.999_999), Some(1));
        assert_eq!(weighted_index(&[0.0, 0.0], 0.5), None);
        assert_eq!(weighted_index(&[1.0, 1.0, 0.0], 1.0), Some(1));
    }

    #[test]
    fn amounts_cover_the_inclusive_range() {
        assert_eq!(uniform_amount(5, 20, 0.0), 5);
        assert_eq!(uniform_amount(5, 20, 0.999_999), 20);
        assert_eq!(uniform_amount(7, 7, 0.5), 7);
        assert_eq!(uniform_amount(0, u32::MAX, 0.0), 0);
        assert_eq!(uniform_amount(u32::MAX - 1, u32::MAX, 0.75), u32::MAX);
    }

    #[test]
    fn every_draw_respects_its_range_and_jackpot_bonus() {
        let catalog = RewardCatalog::standard();
        let mut engine = engine(SeededRandom::new(7));
        for _ in 0..5_000 {
            let outcome = engine.draw(4);
            let entry = catalog.entry(outcome.reward_type).unwrap();
            assert!(entry.contains(outcome.amount), "{:?}", outcome);
            assert_eq!(
                outcome.bonus_gems != 0,
                outcome.reward_type == SpinRewardType::Jackpot
            );
            assert_eq!(outcome.streak_day_at_spin, 4);
        }
    }

    #[test]
    fn draws_converge_to_configured_weights() {
        let catalog = RewardCatalog::standard();
        let mut engine = engine(SeededRandom::new(0xC0FFEE));
        let trials: u32 = 200_000;
        let mut counts: HashMap<SpinRewardType, u32> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(engine.draw(1).reward_type).or_default() += 1;
        }

        for entry in catalog.spin_rewards() {
            let expected = entry.weight / catalog.total_weight();
            let observed = f64::from(counts.get(&entry.reward_type).copied().unwrap_or(0)) / f64::from(trials);
            assert!(
                (observed - expected).abs() < 0.01,
                "{:?}: expected {:.3}, observed {:.3}",
                entry.reward_type,
                expected,
                observed
            );
        }
    }

    #[test]
    fn alternate_catalogs_can_be_injected() {
        let mut rewards = RewardCatalog::standard().spin_rewards().to_vec();
        for entry in &mut rewards {
            entry.weight = if entry.reward_type == SpinRewardType::Gems { 1.0 } else { 0.0 };
        }
        let catalog = RewardCatalog::new(rewards, Vec::<StreakMilestone>::new(), 20, 10.0).unwrap();
        let mut engine = SpinEngine::new(
            Arc::new(catalog),
            Box::new(SeededRandom::new(1)),
            Arc::new(FixedClock::on(2026, 1, 1)),
        );
        for _ in 0..100 {
            assert_eq!(engine.draw(0).reward_type, SpinRewardType::Gems);
        }
    }

    #[test]
    fn streak_day_is_floored_at_one_and_timestamp_comes_from_clock() {
        let clock = FixedClock::on(2026, 3, 14);
        let outcome = engine(SequenceRandom::constant(0.1)).draw(0);
        assert_eq!(outcome.streak_day_at_spin, 1);
        assert_eq!(outcome.timestamp, clock.now());
    }
}
