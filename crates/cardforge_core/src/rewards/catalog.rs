//! crates/cardforge_core/src/rewards/catalog.rs
//!
//! The static reward tables: the weighted spin wheel and the ordered streak
//! milestones. Validated once at construction and shared read-only.

use serde::{Deserialize, Serialize};

use crate::domain::{SpinRewardType, StreakMilestone, StreakRewardType};

/// One slice of the spin wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRewardEntry {
    pub reward_type: SpinRewardType,
    pub weight: f64,
    pub min_amount: u32,
    pub max_amount: u32,
    pub display_name: String,
    pub description: String,
}

impl SpinRewardEntry {
    pub fn new(
        reward_type: SpinRewardType,
        weight: f64,
        min_amount: u32,
        max_amount: u32,
        display_name: &str,
        description: &str,
    ) -> Self {
        Self {
            reward_type,
            weight,
            min_amount,
            max_amount,
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn contains(&self, amount: u32) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }
}

/// Configuration defects, reported when the catalog is built rather than at draw time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid catalog: total spin weight must be positive, got {0}")]
    ZeroTotalWeight(f64),
    #[error("invalid catalog: weight {weight} for {reward_type:?} must be finite and non-negative")]
    InvalidWeight {
        reward_type: SpinRewardType,
        weight: f64,
    },
    #[error("invalid catalog: amount range {min}..={max} for {reward_type:?} is inverted")]
    InvertedRange {
        reward_type: SpinRewardType,
        min: u32,
        max: u32,
    },
    #[error("invalid catalog: {0:?} appears more than once")]
    DuplicateReward(SpinRewardType),
    #[error("invalid catalog: {0:?} is missing from the wheel")]
    MissingReward(SpinRewardType),
    #[error("invalid catalog: milestone day {day} must be at least 1 and above the previous day")]
    MilestoneOrder { day: u32 },
    #[error("invalid catalog: {0}")]
    InvalidSetting(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardCatalog {
    spin_rewards: Vec<SpinRewardEntry>,
    milestones: Vec<StreakMilestone>,
    jackpot_bonus_gems: u32,
    rarity_boost_percent: f64,
    total_weight: f64,
}

impl RewardCatalog {
    /// Validates and freezes a catalog. The wheel order given here is the order
    /// used for cumulative weight selection.
    pub fn new(
        spin_rewards: Vec<SpinRewardEntry>,
        milestones: Vec<StreakMilestone>,
        jackpot_bonus_gems: u32,
        rarity_boost_percent: f64,
    ) -> Result<Self, CatalogError> {
        for reward_type in SpinRewardType::ALL {
            match spin_rewards
                .iter()
                .filter(|entry| entry.reward_type == reward_type)
                .count()
            {
                0 => return Err(CatalogError::MissingReward(reward_type)),
                1 => {}
                _ => return Err(CatalogError::DuplicateReward(reward_type)),
            }
        }

        for entry in &spin_rewards {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(CatalogError::InvalidWeight {
                    reward_type: entry.reward_type,
                    weight: entry.weight,
                });
            }
            if entry.min_amount > entry.max_amount {
                return Err(CatalogError::InvertedRange {
                    reward_type: entry.reward_type,
                    min: entry.min_amount,
                    max: entry.max_amount,
                });
            }
        }

        let total_weight: f64 = spin_rewards.iter().map(|entry| entry.weight).sum();
        if total_weight <= 0.0 {
            return Err(CatalogError::ZeroTotalWeight(total_weight));
        }

        let mut previous = 0;
        for milestone in &milestones {
            if milestone.day <= previous {
                return Err(CatalogError::MilestoneOrder { day: milestone.day });
            }
            previous = milestone.day;
        }

        if jackpot_bonus_gems == 0 {
            return Err(CatalogError::InvalidSetting(
                "jackpot bonus gems must be positive".to_string(),
            ));
        }
        if !rarity_boost_percent.is_finite() || rarity_boost_percent <= 0.0 {
            return Err(CatalogError::InvalidSetting(format!(
                "rarity boost percent must be positive, got {}",
                rarity_boost_percent
            )));
        }

        Ok(Self {
            spin_rewards,
            milestones,
            jackpot_bonus_gems,
            rarity_boost_percent,
            total_weight,
        })
    }

    /// The shipped game economy.
    pub fn standard() -> Self {
        let spin_rewards = vec![
            SpinRewardEntry::new(SpinRewardType::Energy, 40.0, 5, 20, "Energy", "Refills energy for more card pulls."),
            SpinRewardEntry::new(SpinRewardType::Coins, 30.0, 50, 250, "Coins", "A pouch of coins."),
            SpinRewardEntry::new(SpinRewardType::Gems, 10.0, 5, 25, "Gems", "A handful of gems."),
            SpinRewardEntry::new(SpinRewardType::FreePack, 5.0, 1, 1, "Free Pack", "One card pack on the house."),
            SpinRewardEntry::new(SpinRewardType::RarityBoost, 5.0, 1, 3, "Rarity Boost", "Better odds on your next card generations."),
            SpinRewardEntry::new(SpinRewardType::StreakProtection, 5.0, 1, 1, "Streak Shield", "Forgives one missed day."),
            SpinRewardEntry::new(SpinRewardType::Jackpot, 5.0, 1000, 1000, "Jackpot", "1000 coins plus 20 gems."),
        ];
        let milestones = vec![
            StreakMilestone { day: 3, reward_type: StreakRewardType::Coins, amount: 100 },
            StreakMilestone { day: 7, reward_type: StreakRewardType::Gems, amount: 25 },
            StreakMilestone { day: 14, reward_type: StreakRewardType::FreePack, amount: 1 },
            StreakMilestone { day: 30, reward_type: StreakRewardType::RarityBoost, amount: 5 },
        ];
        let total_weight = spin_rewards.iter().map(|entry| entry.weight).sum();

        Self {
            spin_rewards,
            milestones,
            jackpot_bonus_gems: 20,
            rarity_boost_percent: 25.0,
            total_weight,
        }
    }

    pub fn spin_rewards(&self) -> &[SpinRewardEntry] {
        &self.spin_rewards
    }

    pub fn entry(&self, reward_type: SpinRewardType) -> Option<&SpinRewardEntry> {
        self.spin_rewards
            .iter()
            .find(|entry| entry.reward_type == reward_type)
    }

    pub fn milestones(&self) -> &[StreakMilestone] {
        &self.milestones
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn jackpot_bonus_gems(&self) -> u32 {
        self.jackpot_bonus_gems
    }

    /// Boost granted per `RarityBoost` reward; the reward amount is the number of generations.
    pub fn rarity_boost_percent(&self) -> f64 {
        self.rarity_boost_percent
    }

    /// Milestones with `old_streak < day <= new_streak`, ascending.
    pub fn milestones_crossed(&self, old_streak: u32, new_streak: u32) -> Vec<StreakMilestone> {
        self.milestones
            .iter()
            .filter(|milestone| milestone.day > old_streak && milestone.day <= new_streak)
            .copied()
            .collect()
    }
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
