//! crates/cardforge_core/src/rewards/mod.rs
//!
//! The progression economy: spin wheel, streaks, milestones and the rarity boost.

pub mod boost;
pub mod catalog;
pub mod engine;
pub mod spin;
pub mod streak;

pub use catalog::{CatalogError, RewardCatalog, SpinRewardEntry};
pub use engine::RewardEngine;
pub use spin::SpinEngine;
pub use streak::{StreakPhase, StreakTracker, StreakUpdate};
