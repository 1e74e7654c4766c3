//! The three built-in regression model families.
//!
//! Each family exposes a plain config struct that fully determines a model
//! instance, so the winning configuration recorded by a study can rebuild
//! an identical model for the final refit.

pub mod gbt;
pub mod gpr;
pub mod svr;

pub use gbt::{BoostedTrees, BoostedTreesConfig, GrowPolicy};
pub use gpr::{GaussianProcess, GaussianProcessConfig, KernelFamily, KernelSpec};
pub use svr::{Svr, SvrConfig};

use crate::error::Result;

/// Black-box fit/predict/score capability shared by all model families.
///
/// The search driver treats models purely through this trait: it builds one
/// from a sampled configuration, cross-validates it, and later refits the
/// winner on the full training set.
pub trait Regressor {
    /// Fits the model on the given training data.
    ///
    /// # Errors
    ///
    /// Returns an error when the training set is empty or inconsistent, or
    /// when the underlying solver fails.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predicts target values for the given samples.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFitted` if the model has not been fitted.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Scores predictions on the given samples with R².
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFitted` if the model has not been fitted.
    fn score(&self, x: &[Vec<f64>], y: &[f64]) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(crate::metrics::r2_score(y, &predictions))
    }
}
