//! crates/cardforge_core/src/rarity.rs
//!
//! Card rarity odds, and how an effective rarity boost tilts them.

use serde::{Deserialize, Serialize};

use crate::ports::RandomSource;
use crate::rewards::spin::weighted_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl CardRarity {
    /// Rare and above benefit from a rarity boost.
    pub fn is_high(self) -> bool {
        self >= CardRarity::Rare
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RarityOdds {
    weights: Vec<(CardRarity, f64)>,
}

impl RarityOdds {
    pub fn new(weights: Vec<(CardRarity, f64)>) -> Self {
        Self { weights }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            (CardRarity::Common, 60.0),
            (CardRarity::Uncommon, 25.0),
            (CardRarity::Rare, 10.0),
            (CardRarity::Epic, 4.0),
            (CardRarity::Legendary, 1.0),
        ])
    }

    /// Weights after scaling high rarities by `1 + boost_percent / 100`.
    pub fn boosted_weights(&self, boost_percent: f64) -> Vec<f64> {
        let factor = 1.0 + boost_percent.max(0.0) / 100.0;
        self.weights
            .iter()
            .map(|(rarity, weight)| if rarity.is_high() { weight * factor } else { *weight })
            .collect()
    }

    /// Probability of rolling any high rarity under the given boost.
    pub fn high_rarity_chance(&self, boost_percent: f64) -> f64 {
        let weights = self.boosted_weights(boost_percent);
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        let high: f64 = self
            .weights
            .iter()
            .zip(&weights)
            .filter(|((rarity, _), _)| rarity.is_high())
            .map(|(_, weight)| weight)
            .sum();
        high / total
    }

    pub fn roll(&self, random: &mut dyn RandomSource, boost_percent: f64) -> CardRarity {
        let weights = self.boosted_weights(boost_percent);
        weighted_index(&weights, random.next_uniform())
            .map(|index| self.weights[index].0)
            .unwrap_or(CardRarity::Common)
    }
}

impl Default for RarityOdds {
    fn default() -> Self {
        Self::standard()
    }
}
