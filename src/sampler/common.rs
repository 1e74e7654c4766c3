//! Shared distribution-level utilities used across samplers.

use crate::distribution::Distribution;
use crate::param::ParamValue;

/// Generate a random `f64` in the range `[low, high)`.
#[inline]
fn uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Sample a uniformly random value for any distribution.
///
/// Float distributions with `log_scale` are sampled uniformly in log space.
/// Sampled floats are clamped to the declared bounds so that rounding in the
/// exp/ln round trip can never escape the interval.
pub(crate) fn sample_random(rng: &mut fastrand::Rng, distribution: &Distribution) -> ParamValue {
    match distribution {
        Distribution::Float(d) => {
            let value = if d.log_scale {
                uniform(rng, d.low.ln(), d.high.ln()).exp()
            } else {
                uniform(rng, d.low, d.high)
            };
            ParamValue::Float(value.clamp(d.low, d.high))
        }
        Distribution::Int(d) => ParamValue::Int(rng.i64(d.low..=d.high)),
        Distribution::Categorical(d) => ParamValue::Categorical(rng.usize(0..d.n_choices)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{CategoricalDistribution, FloatDistribution, IntDistribution};

    #[test]
    fn test_log_scale_samples_stay_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let dist = Distribution::Float(FloatDistribution {
            low: 1e-3,
            high: 1e3,
            log_scale: true,
        });

        for _ in 0..1000 {
            let ParamValue::Float(v) = sample_random(&mut rng, &dist) else {
                panic!("expected float value");
            };
            assert!((1e-3..=1e3).contains(&v), "sample {v} escaped bounds");
        }
    }

    #[test]
    fn test_int_samples_cover_inclusive_range() {
        let mut rng = fastrand::Rng::with_seed(11);
        let dist = Distribution::Int(IntDistribution { low: 3, high: 9 });

        let mut seen = [false; 7];
        for _ in 0..500 {
            let ParamValue::Int(v) = sample_random(&mut rng, &dist) else {
                panic!("expected integer value");
            };
            assert!((3..=9).contains(&v));
            seen[usize::try_from(v - 3).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s), "not every integer was sampled");
    }

    #[test]
    fn test_categorical_samples_are_valid_indices() {
        let mut rng = fastrand::Rng::with_seed(13);
        let dist = Distribution::Categorical(CategoricalDistribution { n_choices: 3 });

        for _ in 0..100 {
            let ParamValue::Categorical(idx) = sample_random(&mut rng, &dist) else {
                panic!("expected categorical value");
            };
            assert!(idx < 3);
        }
    }
}
