//! Hyperparameter search entry points for the three model families.
//!
//! Each `optimize_*` function runs a fixed-budget, sequential
//! model-based search over its family's hyperparameter space, scoring every
//! sampled configuration with 3-fold cross-validated R², then refits the
//! best configuration on the full training set and returns that single
//! ready-to-predict model.
//!
//! Progress reporting goes through [`SearchObserver`]: the default console
//! observer prints the running best score after every trial and a two-panel
//! chart of the cumulative best at the end. Observers are advisory — the
//! `_with` variants accept [`SilentObserver`] to disable all output without
//! changing the search in any way.

mod gbt;
mod gpr;
mod svr;

pub use gbt::{GBT_TRIAL_BUDGET, optimize_gbt, optimize_gbt_with};
pub use gpr::{GPR_TRIAL_BUDGET, optimize_gpr, optimize_gpr_with};
pub use svr::{SVR_TRIAL_BUDGET, optimize_svr, optimize_svr_with};

use crate::dataset::check_consistency;
use crate::error::Result;
use crate::model_selection::{FoldExecution, KFold, cross_val_score, mean_score};
use crate::models::Regressor;
use crate::sampler::CompletedTrial;
use crate::sampler::tpe::TpeSampler;
use crate::study::Study;
use crate::trial::Trial;
use crate::visualization::OptimizationHistory;

/// Number of cross-validation folds used by every family's objective.
pub const CV_FOLDS: usize = 3;

/// Observer of one optimization run's progress.
///
/// Both hooks default to no-ops. Observers cannot influence which
/// configurations are sampled; removing one never changes the search result.
pub trait SearchObserver {
    /// Called after each trial has been recorded.
    fn trial_finished(&self, _study: &Study, _trial: &CompletedTrial) {}

    /// Called once after the refit, with the full score history.
    fn search_finished(&self, _history: &OptimizationHistory) {}
}

/// Prints a `Best R2:` line per trial and the cumulative-best chart at the
/// end, mirroring the search's observable side effects described above.
pub struct ConsoleObserver;

impl SearchObserver for ConsoleObserver {
    fn trial_finished(&self, study: &Study, _trial: &CompletedTrial) {
        if let Ok(best) = study.best_value() {
            println!("Best R2: {best}");
        }
    }

    fn search_finished(&self, history: &OptimizationHistory) {
        println!("{}", history.to_text());
    }
}

/// Discards all progress notifications.
pub struct SilentObserver;

impl SearchObserver for SilentObserver {}

/// Shared driver for all three families: validate, search, refit, report.
///
/// `build_from_trial` maps a trial's sampled point to a concrete model;
/// `build_from_best` rebuilds the identical model from the recorded winning
/// configuration for the refit.
fn search_and_refit<M>(
    x: &[Vec<f64>],
    y: &[f64],
    n_trials: usize,
    execution: FoldExecution,
    observer: &dyn SearchObserver,
    build_from_trial: impl Fn(&mut Trial) -> Result<M>,
    build_from_best: impl Fn(&CompletedTrial) -> Result<M>,
) -> Result<M>
where
    M: Regressor + Clone + Send + Sync,
{
    check_consistency(x, y)?;

    let study = Study::maximize(TpeSampler::new());
    let kfold = KFold::new(CV_FOLDS);

    let report = |study: &Study, trial: &CompletedTrial| observer.trial_finished(study, trial);
    study.optimize_with_callbacks(
        n_trials,
        |trial| {
            let model = build_from_trial(trial)?;
            let scores = cross_val_score(&model, x, y, &kfold, execution)?;
            Ok(mean_score(&scores))
        },
        &[&report],
    )?;

    let best = study.best_trial()?;
    tracing::info!(
        best_score = best.value,
        "refitting best configuration on the full training set"
    );
    let mut model = build_from_best(&best)?;
    model.fit(x, y)?;

    let history = OptimizationHistory::from_trials(&study.trials());
    observer.search_finished(&history);

    Ok(model)
}
