//! Uniform random sampler.

use parking_lot::Mutex;

use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::types::Direction;

use super::common::sample_random;
use super::{CompletedTrial, Sampler};

/// A sampler that draws every hyperparameter uniformly at random.
///
/// Ignores trial history entirely. Useful as a baseline and as the fallback
/// strategy other samplers use before they have enough history.
///
/// # Examples
///
/// ```
/// use hypertune::sampler::random::RandomSampler;
/// use hypertune::{Direction, Study};
///
/// let study = Study::with_sampler(Direction::Maximize, RandomSampler::with_seed(42));
/// ```
pub struct RandomSampler {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSampler {
    /// Creates a new random sampler seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a new random sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &self,
        _name: &str,
        distribution: &Distribution,
        _direction: Direction,
        _trial_id: u64,
        _history: &[CompletedTrial],
    ) -> ParamValue {
        sample_random(&mut self.rng.lock(), distribution)
    }
}
