//! crates/cardforge_core/src/rewards/boost.rs
//!
//! Generation-limited rarity boost bookkeeping.

use tracing::debug;

use crate::domain::RarityBoostState;

impl RarityBoostState {
    /// Replaces any current boost. Non-positive inputs leave the boost inactive.
    pub fn apply_boost(&mut self, percent: f64, generations: u32) {
        if percent.is_nan() || percent <= 0.0 || generations == 0 {
            *self = RarityBoostState::default();
            return;
        }
        self.active = true;
        self.boost_percent = percent;
        self.expires_after_generations = generations;
        debug!(percent, generations, "Rarity boost applied.");
    }

    /// Spends one boosted generation and returns the percent it grants, or 0
    /// when no boost is active. Call once per real generation attempt.
    pub fn consume_one_generation(&mut self) -> f64 {
        if !self.active || self.expires_after_generations == 0 {
            *self = RarityBoostState::default();
            return 0.0;
        }

        let percent = self.boost_percent;
        self.expires_after_generations -= 1;
        if self.expires_after_generations == 0 {
            *self = RarityBoostState::default();
        }
        percent
    }

    /// The percent the next generation would receive, without consuming it.
    pub fn effective_percent(&self) -> f64 {
        if self.active && self.expires_after_generations > 0 {
            self.boost_percent
        } else {
            0.0
        }
    }
}
