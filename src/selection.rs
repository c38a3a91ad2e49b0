use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How `advance` picks the next active index.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum SelectionPolicy {
    /// Walk the sequence in order, wrapping at the end.
    Sequential,
    /// Draw a uniformly random index every step.
    #[default]
    Random,
}

/// Picks indices according to a policy. Owns its random source so tests
/// can seed it.
#[derive(Debug, Clone)]
pub struct IndexPicker {
    policy: SelectionPolicy,
    rng: StdRng,
}

impl IndexPicker {
    pub fn new(policy: SelectionPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { policy, rng }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Next index for a sequence of `len` values, given the current one.
    pub fn next(&mut self, current: usize, len: usize) -> usize {
        debug_assert!(len > 0);
        match self.policy {
            SelectionPolicy::Sequential => (current + 1) % len,
            SelectionPolicy::Random => self.rng.gen_range(0..len),
        }
    }
}
