//! services/forge/src/adapters/random.rs
//!
//! `rand`-backed implementation of the `RandomSource` port.

use cardforge_core::ports::RandomSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct RngRandomSource {
    rng: StdRng,
}

impl RngRandomSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence, for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for RngRandomSource {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
