//! Support-vector regression with an RBF kernel.

use crate::error::{Error, Result};

use super::Regressor;

/// Convergence tolerance for the dual coordinate descent, relative to `C`.
const TOLERANCE: f64 = 1e-6;
/// Maximum number of coordinate descent sweeps.
const MAX_SWEEPS: usize = 1000;

/// Hyperparameters of a support-vector regressor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvrConfig {
    /// Box constraint: the maximum absolute dual coefficient per sample.
    pub c: f64,
    /// Width of the epsilon-insensitive tube around the targets.
    pub epsilon: f64,
}

/// Epsilon-insensitive support-vector regressor with an RBF kernel.
///
/// The kernel width follows the common `scale` heuristic,
/// `gamma = 1 / (n_features * Var(X))`, so the two tunable hyperparameters
/// are the box constraint `C` and the tube width `epsilon`.
///
/// Training solves the dual problem by coordinate descent: each dual
/// coefficient in turn is set to the exact minimizer of its one-dimensional
/// subproblem (a soft-thresholded residual, clipped to `[-C, C]`), until no
/// coefficient moves more than a tolerance.
#[derive(Clone, Debug)]
pub struct Svr {
    config: SvrConfig,
    fitted: Option<FittedSvr>,
}

#[derive(Clone, Debug)]
struct FittedSvr {
    /// Training rows with non-zero dual coefficients.
    support: Vec<Vec<f64>>,
    /// Dual coefficients matching `support`.
    coefficients: Vec<f64>,
    /// Constant offset (mean of the training targets).
    bias: f64,
    /// RBF kernel width.
    gamma: f64,
}

impl Svr {
    /// Creates an unfitted regressor with the given hyperparameters.
    #[must_use]
    pub fn new(config: SvrConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Returns the hyperparameters this model was built with.
    #[must_use]
    pub fn config(&self) -> &SvrConfig {
        &self.config
    }

    /// Returns the number of support vectors of the fitted model, if any.
    #[must_use]
    pub fn n_support(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.support.len())
    }

    /// RBF kernel width via the `scale` heuristic.
    #[allow(clippy::cast_precision_loss)]
    fn scale_gamma(x: &[Vec<f64>]) -> f64 {
        let d = x[0].len().max(1) as f64;
        let n_entries = x.iter().map(Vec::len).sum::<usize>().max(1) as f64;

        let mean = x.iter().flatten().sum::<f64>() / n_entries;
        let variance = x
            .iter()
            .flatten()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n_entries;

        if variance > 0.0 { 1.0 / (d * variance) } else { 1.0 / d }
    }

    fn rbf(gamma: f64, a: &[f64], b: &[f64]) -> f64 {
        let squared_distance: f64 = a.iter().zip(b).map(|(ai, bi)| (ai - bi).powi(2)).sum();
        (-gamma * squared_distance).exp()
    }

    /// `sign(u) * max(|u| - threshold, 0)`
    fn soft_threshold(u: f64, threshold: f64) -> f64 {
        if u > threshold {
            u - threshold
        } else if u < -threshold {
            u + threshold
        } else {
            0.0
        }
    }
}

impl Regressor for Svr {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if x.len() != y.len() {
            return Err(Error::SampleCountMismatch {
                features: x.len(),
                targets: y.len(),
            });
        }
        let n = x.len();
        if n == 0 {
            return Err(Error::EmptyTrainingSet);
        }

        let gamma = Self::scale_gamma(x);
        let bias = y.iter().sum::<f64>() / n as f64;
        let residuals: Vec<f64> = y.iter().map(|yi| yi - bias).collect();

        let kernel: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| Self::rbf(gamma, &x[i], &x[j])).collect())
            .collect();

        let mut beta = vec![0.0_f64; n];
        // Current decision values f_i = sum_j beta_j K_ij, updated incrementally.
        let mut decision = vec![0.0_f64; n];
        let tolerance = TOLERANCE * self.config.c.max(1.0);

        for _ in 0..MAX_SWEEPS {
            let mut max_delta = 0.0_f64;

            for i in 0..n {
                let k_ii = kernel[i][i];
                let decision_without_i = decision[i] - k_ii * beta[i];
                let u = residuals[i] - decision_without_i;

                let unclipped = Self::soft_threshold(u, self.config.epsilon) / k_ii;
                let updated = unclipped.clamp(-self.config.c, self.config.c);
                let delta = updated - beta[i];

                if delta.abs() > 0.0 {
                    for j in 0..n {
                        decision[j] += delta * kernel[i][j];
                    }
                    beta[i] = updated;
                }
                max_delta = max_delta.max(delta.abs());
            }

            if max_delta < tolerance {
                break;
            }
        }

        let mut support = Vec::new();
        let mut coefficients = Vec::new();
        for (i, &b) in beta.iter().enumerate() {
            if b != 0.0 {
                support.push(x[i].clone());
                coefficients.push(b);
            }
        }

        self.fitted = Some(FittedSvr {
            support,
            coefficients,
            bias,
            gamma,
        });
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;

        Ok(x.iter()
            .map(|row| {
                let kernel_sum: f64 = fitted
                    .support
                    .iter()
                    .zip(&fitted.coefficients)
                    .map(|(sv, &coeff)| coeff * Self::rbf(fitted.gamma, sv, row))
                    .sum();
                fitted.bias + kernel_sum
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 / n as f64]).collect();
        let y: Vec<f64> = x.iter().map(|row| 2.0 * row[0] + 1.0).collect();
        (x, y)
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = Svr::new(SvrConfig {
            c: 1.0,
            epsilon: 0.1,
        });
        assert!(matches!(
            model.predict(&[vec![0.0]]),
            Err(Error::NotFitted)
        ));
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let mut model = Svr::new(SvrConfig {
            c: 1.0,
            epsilon: 0.1,
        });
        assert!(matches!(model.fit(&[], &[]), Err(Error::EmptyTrainingSet)));
    }

    #[test]
    fn test_fits_linear_relationship() {
        let (x, y) = linear_data(30);
        let mut model = Svr::new(SvrConfig {
            c: 100.0,
            epsilon: 0.01,
        });
        model.fit(&x, &y).unwrap();

        let score = model.score(&x, &y).unwrap();
        assert!(score > 0.9, "training R² {score} too low");
    }

    #[test]
    fn test_wide_tube_shrinks_to_mean_predictor() {
        let (x, y) = linear_data(20);
        // Tube wider than the target spread: every point fits inside it,
        // so all dual coefficients stay zero and the model predicts the mean.
        let mut model = Svr::new(SvrConfig {
            c: 100.0,
            epsilon: 10.0,
        });
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_support(), Some(0));
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let predictions = model.predict(&x).unwrap();
        for p in predictions {
            assert!((p - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_coefficients_respect_box_constraint() {
        let (x, mut y) = linear_data(20);
        // An outlier forces the corresponding coefficient to the box limit.
        y[10] += 100.0;
        let c = 0.5;
        let mut model = Svr::new(SvrConfig { c, epsilon: 0.01 });
        model.fit(&x, &y).unwrap();

        let fitted = model.fitted.as_ref().unwrap();
        for &coeff in &fitted.coefficients {
            assert!(coeff.abs() <= c + 1e-12, "coefficient {coeff} outside box");
        }
    }

    #[test]
    fn test_sample_count_mismatch_rejected() {
        let mut model = Svr::new(SvrConfig {
            c: 1.0,
            epsilon: 0.1,
        });
        let result = model.fit(&[vec![0.0], vec![1.0]], &[0.0]);
        assert!(matches!(result, Err(Error::SampleCountMismatch { .. })));
    }
}
