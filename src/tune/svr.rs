//! Search space and objective for the support-vector-regression family.

use crate::error::Result;
use crate::model_selection::FoldExecution;
use crate::models::{Svr, SvrConfig};
use crate::sampler::CompletedTrial;
use crate::trial::Trial;

use super::{ConsoleObserver, SearchObserver, search_and_refit};

/// Number of trials in one SVR search.
pub const SVR_TRIAL_BUDGET: usize = 100;

/// Box-constraint search range (log-uniform).
const C_RANGE: (f64, f64) = (1e-3, 1e3);
/// Tube-width search range (log-uniform).
const EPSILON_RANGE: (f64, f64) = (1e-3, 1e1);

/// Maps one sampled point to a fully specified SVR.
fn sample_model(trial: &mut Trial) -> Result<Svr> {
    let c = trial.suggest_log_float("C", C_RANGE.0, C_RANGE.1)?;
    let epsilon = trial.suggest_log_float("epsilon", EPSILON_RANGE.0, EPSILON_RANGE.1)?;
    Ok(Svr::new(SvrConfig { c, epsilon }))
}

/// Rebuilds the SVR recorded as the best configuration.
fn rebuild_model(best: &CompletedTrial) -> Result<Svr> {
    let c = best.float("C")?;
    let epsilon = best.float("epsilon")?;
    Ok(Svr::new(SvrConfig { c, epsilon }))
}

/// Tunes a support-vector regressor on the training set and returns the
/// best configuration refitted on all of it.
///
/// Searches `C` log-uniformly over `[1e-3, 1e3]` and `epsilon` log-uniformly
/// over `[1e-3, 1e1]` for exactly [`SVR_TRIAL_BUDGET`] trials, maximizing
/// mean 3-fold cross-validated R². Progress goes to the console; use
/// [`optimize_svr_with`] to substitute another observer.
///
/// # Errors
///
/// Returns `Error::SampleCountMismatch` when `x` and `y` disagree on sample
/// count, `Error::InsufficientSamples` when there are fewer samples than
/// cross-validation folds, and any model-fitting error raised during
/// evaluation — a failed trial fails the whole run.
pub fn optimize_svr(x: &[Vec<f64>], y: &[f64]) -> Result<Svr> {
    optimize_svr_with(x, y, &ConsoleObserver)
}

/// [`optimize_svr`] with a caller-supplied progress observer.
///
/// # Errors
///
/// See [`optimize_svr`].
pub fn optimize_svr_with(
    x: &[Vec<f64>],
    y: &[f64],
    observer: &dyn SearchObserver,
) -> Result<Svr> {
    search_and_refit(
        x,
        y,
        SVR_TRIAL_BUDGET,
        FoldExecution::Sequential,
        observer,
        sample_model,
        rebuild_model,
    )
}
