//! Search space and objective for the Gaussian-process family.

use crate::error::{Error, Result};
use crate::model_selection::FoldExecution;
use crate::models::{GaussianProcess, GaussianProcessConfig, KernelFamily, KernelSpec};
use crate::sampler::CompletedTrial;
use crate::trial::Trial;

use super::{ConsoleObserver, SearchObserver, search_and_refit};

/// Number of trials in one Gaussian-process search.
///
/// An order of magnitude fewer than the other families: every trial pays
/// for cubic-cost factorizations across restarts and folds.
pub const GPR_TRIAL_BUDGET: usize = 10;

/// Kernel-family choices; sampling and refit both index into this array, so
/// the winning kernel is reconstructed by the exact rule that sampled it.
const KERNEL_CHOICES: [KernelFamily; 3] = [
    KernelFamily::Rbf,
    KernelFamily::Matern32,
    KernelFamily::Matern52,
];
/// Length-scale search range (log-uniform).
const LENGTH_SCALE_RANGE: (f64, f64) = (1e-2, 1e2);
/// Restart-count search range.
const N_RESTARTS_RANGE: (i64, i64) = (0, 10);
/// Fixed noise floor on the kernel diagonal.
const NOISE_FLOOR: f64 = 1e-10;

#[allow(clippy::cast_sign_loss)]
fn config_from_values(
    family: KernelFamily,
    length_scale: f64,
    n_restarts: i64,
) -> GaussianProcessConfig {
    GaussianProcessConfig {
        kernel: KernelSpec::new(family, length_scale),
        alpha: NOISE_FLOOR,
        n_restarts_optimizer: n_restarts as usize,
    }
}

/// Maps one sampled point to a fully specified Gaussian-process regressor.
fn sample_model(trial: &mut Trial) -> Result<GaussianProcess> {
    let family = trial.suggest_categorical("kernel", &KERNEL_CHOICES)?;
    let length_scale =
        trial.suggest_log_float("length_scale", LENGTH_SCALE_RANGE.0, LENGTH_SCALE_RANGE.1)?;
    let n_restarts =
        trial.suggest_int("n_restarts_optimizer", N_RESTARTS_RANGE.0, N_RESTARTS_RANGE.1)?;

    Ok(GaussianProcess::new(config_from_values(
        family,
        length_scale,
        n_restarts,
    )))
}

/// Rebuilds the Gaussian-process regressor recorded as the best
/// configuration, reconstructing the kernel from its recorded tag and
/// length scale.
fn rebuild_model(best: &CompletedTrial) -> Result<GaussianProcess> {
    let family = KERNEL_CHOICES
        .get(best.categorical("kernel")?)
        .copied()
        .ok_or_else(|| Error::ParameterType {
            name: "kernel".to_string(),
            expected: "categorical",
        })?;

    Ok(GaussianProcess::new(config_from_values(
        family,
        best.float("length_scale")?,
        best.int("n_restarts_optimizer")?,
    )))
}

/// Tunes a Gaussian-process regressor on the training set and returns the
/// best configuration refitted on all of it.
///
/// Searches the kernel family over {RBF, Matérn ν=3/2, Matérn ν=5/2} with a
/// shared `length_scale` log-uniform over `[1e-2, 1e2]` and
/// `n_restarts_optimizer` over `[0, 10]`, for exactly [`GPR_TRIAL_BUDGET`]
/// trials, maximizing mean 3-fold cross-validated R². Cross-validation
/// folds are evaluated concurrently, and any fold error fails the run
/// immediately. Progress goes to the console; use [`optimize_gpr_with`] to
/// substitute another observer.
///
/// # Errors
///
/// Returns `Error::SampleCountMismatch` when `x` and `y` disagree on sample
/// count, `Error::InsufficientSamples` when there are fewer samples than
/// cross-validation folds, and any fold-evaluation error — including
/// `Error::KernelFactorization` when a sampled kernel cannot be factorized.
pub fn optimize_gpr(x: &[Vec<f64>], y: &[f64]) -> Result<GaussianProcess> {
    optimize_gpr_with(x, y, &ConsoleObserver)
}

/// [`optimize_gpr`] with a caller-supplied progress observer.
///
/// # Errors
///
/// See [`optimize_gpr`].
pub fn optimize_gpr_with(
    x: &[Vec<f64>],
    y: &[f64],
    observer: &dyn SearchObserver,
) -> Result<GaussianProcess> {
    search_and_refit(
        x,
        y,
        GPR_TRIAL_BUDGET,
        FoldExecution::Parallel,
        observer,
        sample_model,
        rebuild_model,
    )
}
