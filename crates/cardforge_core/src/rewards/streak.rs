//! crates/cardforge_core/src/rewards/streak.rs
//!
//! Day-based streak bookkeeping and milestone detection.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use super::catalog::RewardCatalog;
use crate::domain::{StreakMilestone, StreakState};

/// Where a streak stands relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakPhase {
    NoStreak,
    Active(u32),
    /// The streak lapsed, but the next activity will spend a protection charge to keep it.
    BrokenPendingProtection,
}

/// Result of `StreakTracker::record_activity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub state: StreakState,
    /// Newly crossed milestones, ascending by day. Each must be applied exactly once.
    pub milestones: Vec<StreakMilestone>,
}

pub struct StreakTracker {
    catalog: Arc<RewardCatalog>,
    state: StreakState,
}

impl StreakTracker {
    pub fn new(catalog: Arc<RewardCatalog>) -> Self {
        Self::from_state(catalog, StreakState::default())
    }

    pub fn from_state(catalog: Arc<RewardCatalog>, state: StreakState) -> Self {
        Self { catalog, state }
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    pub fn phase(&self, today: NaiveDate) -> StreakPhase {
        let Some(last) = self.state.last_active_day else {
            return StreakPhase::NoStreak;
        };
        if self.state.current_streak == 0 {
            return StreakPhase::NoStreak;
        }
        if (today - last).num_days() <= 1 {
            StreakPhase::Active(self.state.current_streak)
        } else if self.state.protection_charges > 0 {
            StreakPhase::BrokenPendingProtection
        } else {
            StreakPhase::NoStreak
        }
    }

    pub fn record_activity(&mut self, today: NaiveDate) -> StreakUpdate {
        let old_streak = self.state.current_streak;

        let base = match self.state.last_active_day {
            None => 0,
            Some(last) => {
                let gap = (today - last).num_days();
                if gap <= 0 {
                    // Same day, or a clock that moved backwards.
                    return self.unchanged();
                }
                if gap == 1 {
                    old_streak
                } else if self.state.protection_charges > 0 {
                    self.state.protection_charges -= 1;
                    info!(
                        gap_days = gap,
                        charges_left = self.state.protection_charges,
                        "Protection charge spent to keep the streak."
                    );
                    old_streak
                } else {
                    info!(gap_days = gap, lost_streak = old_streak, "Streak reset.");
                    0
                }
            }
        };

        self.state.current_streak = base + 1;
        self.state.last_active_day = Some(today);

        let milestones = self
            .catalog
            .milestones_crossed(base, self.state.current_streak);
        debug!(
            streak = self.state.current_streak,
            milestones = milestones.len(),
            "Activity recorded."
        );

        StreakUpdate {
            state: self.state.clone(),
            milestones,
        }
    }

    pub fn add_protection_charge(&mut self) {
        self.state.protection_charges += 1;
    }

    fn unchanged(&self) -> StreakUpdate {
        StreakUpdate {
            state: self.state.clone(),
            milestones: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::day;

    fn tracker() -> StreakTracker {
        StreakTracker::new(Arc::new(RewardCatalog::standard()))
    }

    fn milestone_days(update: &StreakUpdate) -> Vec<u32> {
        update.milestones.iter().map(|m| m.day).collect()
    }

    #[test]
    fn first_activity_starts_a_streak() {
        let mut tracker = tracker();
        assert_eq!(tracker.phase(day(2026, 5, 1)), StreakPhase::NoStreak);

        let update = tracker.record_activity(day(2026, 5, 1));
        assert_eq!(update.state.current_streak, 1);
        assert_eq!(update.state.last_active_day, Some(day(2026, 5, 1)));
        assert!(update.milestones.is_empty());
        assert_eq!(tracker.phase(day(2026, 5, 2)), StreakPhase::Active(1));
    }

    #[test]
    fn same_day_is_idempotent() {
        let mut tracker = tracker();
        tracker.record_activity(day(2026, 5, 1));
        tracker.record_activity(day(2026, 5, 2));
        let first = tracker.record_activity(day(2026, 5, 3));
        assert_eq!(milestone_days(&first), vec![3]);

        let second = tracker.record_activity(day(2026, 5, 3));
        assert_eq!(second.state, first.state);
        assert!(second.milestones.is_empty());
    }

    #[test]
    fn consecutive_days_cross_milestones_once_in_order() {
        let mut tracker = tracker();
        let mut crossed = Vec::new();
        for offset in 0..30 {
            let today = day(2026, 1, 1) + chrono::Duration::days(offset);
            crossed.extend(milestone_days(&tracker.record_activity(today)));
            crossed.extend(milestone_days(&tracker.record_activity(today)));
        }
        assert_eq!(crossed, vec![3, 7, 14, 30]);
        assert_eq!(tracker.state().current_streak, 30);
    }

    #[test]
    fn gap_without_charges_resets_to_one() {
        let mut tracker = StreakTracker::from_state(
            Arc::new(RewardCatalog::standard()),
            StreakState {
                current_streak: 9,
                last_active_day: Some(day(2026, 5, 1)),
                protection_charges: 0,
            },
        );
        assert_eq!(tracker.phase(day(2026, 5, 3)), StreakPhase::NoStreak);

        let update = tracker.record_activity(day(2026, 5, 3));
        assert_eq!(update.state.current_streak, 1);
        assert!(update.milestones.is_empty());
    }

    #[test]
    fn gap_with_charge_consumes_exactly_one_and_continues() {
        let mut tracker = StreakTracker::from_state(
            Arc::new(RewardCatalog::standard()),
            StreakState {
                current_streak: 6,
                last_active_day: Some(day(2026, 5, 1)),
                protection_charges: 2,
            },
        );
        assert_eq!(tracker.phase(day(2026, 5, 5)), StreakPhase::BrokenPendingProtection);

        let update = tracker.record_activity(day(2026, 5, 5));
        assert_eq!(update.state.current_streak, 7);
        assert_eq!(update.state.protection_charges, 1);
        assert_eq!(milestone_days(&update), vec![7]);
    }

    #[test]
    fn reset_streak_can_earn_early_milestones_again() {
        let mut tracker = StreakTracker::from_state(
            Arc::new(RewardCatalog::standard()),
            StreakState {
                current_streak: 5,
                last_active_day: Some(day(2026, 5, 1)),
                protection_charges: 0,
            },
        );
        tracker.record_activity(day(2026, 5, 10));
        tracker.record_activity(day(2026, 5, 11));
        let update = tracker.record_activity(day(2026, 5, 12));
        assert_eq!(update.state.current_streak, 3);
        assert_eq!(milestone_days(&update), vec![3]);
    }

    #[test]
    fn earlier_day_is_ignored() {
        let mut tracker = tracker();
        tracker.record_activity(day(2026, 5, 10));
        let update = tracker.record_activity(day(2026, 5, 8));
        assert_eq!(update.state.current_streak, 1);
        assert_eq!(update.state.last_active_day, Some(day(2026, 5, 10)));
    }

    #[test]
    fn protection_charges_accumulate() {
        let mut tracker = tracker();
        tracker.add_protection_charge();
        tracker.add_protection_charge();
        assert_eq!(tracker.state().protection_charges, 2);
    }
}
