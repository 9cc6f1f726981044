//! crates/cardforge_core/src/rewards/engine.rs
//!
//! The facade the app talks to: one spin per user gesture, streak update,
//! milestone detection and the shared rarity boost, all behind `&mut self`
//! so a single owner serializes every mutation.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use super::catalog::RewardCatalog;
use super::spin::SpinEngine;
use super::streak::{StreakPhase, StreakTracker};
use crate::domain::{
    RarityBoostState, RewardGrant, RewardSnapshot, SpinResult, SpinRewardType, StreakRewardType,
    StreakState,
};
use crate::ports::{Clock, RandomSource};

pub struct RewardEngine {
    catalog: Arc<RewardCatalog>,
    spins: SpinEngine,
    streak: StreakTracker,
    boost: RarityBoostState,
    last_spin_day: Option<NaiveDate>,
}

impl RewardEngine {
    pub fn new(catalog: Arc<RewardCatalog>, random: Box<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self::restore(catalog, random, clock, RewardSnapshot::default())
    }

    /// Rebuilds an engine from state a collaborator persisted earlier.
    pub fn restore(
        catalog: Arc<RewardCatalog>,
        random: Box<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        snapshot: RewardSnapshot,
    ) -> Self {
        Self {
            spins: SpinEngine::new(catalog.clone(), random, clock),
            streak: StreakTracker::from_state(catalog.clone(), snapshot.streak),
            catalog,
            boost: snapshot.boost,
            last_spin_day: snapshot.last_spin_day,
        }
    }

    pub fn snapshot(&self) -> RewardSnapshot {
        RewardSnapshot {
            streak: self.streak.state().clone(),
            boost: self.boost.clone(),
            last_spin_day: self.last_spin_day,
        }
    }

    /// Puts streak, boost and spin-day state back to `snapshot`, keeping the
    /// catalog and random source. Used to undo a spin nobody recorded.
    pub fn rewind(&mut self, snapshot: RewardSnapshot) {
        self.streak = StreakTracker::from_state(self.catalog.clone(), snapshot.streak);
        self.boost = snapshot.boost;
        self.last_spin_day = snapshot.last_spin_day;
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    pub fn streak(&self) -> &StreakState {
        self.streak.state()
    }

    pub fn streak_phase(&self, today: NaiveDate) -> StreakPhase {
        self.streak.phase(today)
    }

    pub fn rarity_boost(&self) -> &RarityBoostState {
        &self.boost
    }

    /// Daily gating is left to the caller; this only reports it.
    pub fn has_spun_on(&self, day: NaiveDate) -> bool {
        self.last_spin_day == Some(day)
    }

    /// Records today's activity, draws a reward at the resulting streak day and
    /// applies the effects the engine owns (rarity boost, protection charges).
    /// Boost generations from crossed milestones and from the spin itself are
    /// summed into a single boost.
    pub fn spin(&mut self, today: NaiveDate) -> SpinResult {
        let update = self.streak.record_activity(today);
        let outcome = self.spins.draw(update.state.current_streak);

        // Milestone and spin boost generations are summed, then applied once.
        let mut boost_generations: u32 = 0;

        for milestone in &update.milestones {
            match milestone.reward_type {
                StreakRewardType::RarityBoost => {
                    boost_generations = boost_generations.saturating_add(milestone.amount)
                }
                StreakRewardType::StreakProtection => {
                    for _ in 0..milestone.amount {
                        self.streak.add_protection_charge();
                    }
                }
                _ => {}
            }
        }

        match outcome.reward_type {
            SpinRewardType::RarityBoost => {
                boost_generations = boost_generations.saturating_add(outcome.amount)
            }
            SpinRewardType::StreakProtection => {
                for _ in 0..outcome.amount {
                    self.streak.add_protection_charge();
                }
            }
            _ => {}
        }

        if boost_generations > 0 {
            self.boost
                .apply_boost(self.catalog.rarity_boost_percent(), boost_generations);
        }

        self.last_spin_day = Some(today);
        info!(
            reward = ?outcome.reward_type,
            amount = outcome.amount,
            streak = outcome.streak_day_at_spin,
            milestones = update.milestones.len(),
            "Spin resolved."
        );

        SpinResult {
            outcome,
            milestones_crossed: update.milestones,
        }
    }

    /// Spends one boosted generation; 0 when no boost is active.
    pub fn consume_generation_rarity_boost(&mut self) -> f64 {
        self.boost.consume_one_generation()
    }

    /// Currency the collaborator must credit for a spin result.
    pub fn grant_for(result: &SpinResult) -> RewardGrant {
        let mut grant = RewardGrant::default();
        let outcome = &result.outcome;
        let amount = u64::from(outcome.amount);
        match outcome.reward_type {
            SpinRewardType::Energy => grant.energy += amount,
            SpinRewardType::Coins | SpinRewardType::Jackpot => grant.coins += amount,
            SpinRewardType::Gems => grant.gems += amount,
            SpinRewardType::FreePack => grant.free_packs += amount,
            SpinRewardType::RarityBoost | SpinRewardType::StreakProtection => {}
        }
        grant.gems += u64::from(outcome.bonus_gems);

        for milestone in &result.milestones_crossed {
            let amount = u64::from(milestone.amount);
            match milestone.reward_type {
                StreakRewardType::Coins => grant.coins += amount,
                StreakRewardType::Gems => grant.gems += amount,
                StreakRewardType::Energy => grant.energy += amount,
                StreakRewardType::FreePack => grant.free_packs += amount,
                StreakRewardType::RarityBoost | StreakRewardType::StreakProtection => {}
            }
        }
        grant
    }
}
