#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]

//! Sequential model-based hyperparameter search for regression models.
//!
//! Three built-in model families — support-vector regression,
//! gradient-boosted trees, and Gaussian-process regression — are each tuned
//! by a fixed-budget, adaptively sampled search that scores every candidate
//! configuration with 3-fold cross-validated R², then refits the winning
//! configuration on the full training set and returns one ready-to-predict
//! model.
//!
//! # Getting Started
//!
//! ```no_run
//! use hypertune::optimize_svr;
//! use hypertune::models::Regressor;
//!
//! # fn main() -> hypertune::Result<()> {
//! // 20 samples x 3 features, with a noisy linear target.
//! let x: Vec<Vec<f64>> = (0..20)
//!     .map(|i| vec![f64::from(i), f64::from(i % 5), f64::from(i % 3)])
//!     .collect();
//! let y: Vec<f64> = x.iter().map(|r| 1.5 * r[0] - 0.5 * r[1] + r[2]).collect();
//!
//! let model = optimize_svr(&x, &y)?;
//! let predictions = model.predict(&x)?;
//! # let _ = predictions;
//! # Ok(())
//! # }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Study`] | Drive an optimization loop: create trials, record results, track the best. |
//! | [`Trial`] | A single evaluation of the objective, carrying suggested hyperparameter values. |
//! | [`Sampler`](sampler::Sampler) | Strategy for proposing the next configuration ([`TpeSampler`](sampler::tpe::TpeSampler) or [`RandomSampler`](sampler::random::RandomSampler)). |
//! | [`Regressor`](models::Regressor) | Black-box fit/predict/score capability of the model families. |
//! | [`OptimizationHistory`] | Cumulative-best view of a finished search, as text or HTML. |
//!
//! The `optimize_*` entry points wire these together for their model family;
//! the building blocks stay public for custom search loops.
//!
//! # Logging
//!
//! The library emits [`tracing`] events but never installs a subscriber.
//! Call [`logging::init`] once at startup — or install your own subscriber —
//! to control verbosity process-wide. Per-trial progress lines are separate
//! from logging and flow through [`tune::SearchObserver`].

mod dataset;
mod distribution;
mod error;
pub mod logging;
mod metrics;
pub mod model_selection;
pub mod models;
mod param;
pub mod sampler;
mod study;
mod trial;
pub mod tune;
mod types;
mod visualization;

pub use dataset::check_consistency;
pub use distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
pub use error::{Error, Result};
pub use metrics::{mean_squared_error, r2_score};
pub use param::ParamValue;
pub use sampler::CompletedTrial;
pub use study::{Study, TrialCallback};
pub use trial::Trial;
pub use tune::{optimize_gbt, optimize_gpr, optimize_svr};
pub use types::Direction;
pub use visualization::OptimizationHistory;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hypertune::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::logging::{self, Verbosity};
    pub use crate::model_selection::{FoldExecution, KFold, cross_val_score};
    pub use crate::models::{
        BoostedTrees, BoostedTreesConfig, GaussianProcess, GaussianProcessConfig, GrowPolicy,
        KernelFamily, KernelSpec, Regressor, Svr, SvrConfig,
    };
    pub use crate::param::ParamValue;
    pub use crate::sampler::random::RandomSampler;
    pub use crate::sampler::tpe::TpeSampler;
    pub use crate::sampler::{CompletedTrial, Sampler};
    pub use crate::study::Study;
    pub use crate::trial::Trial;
    pub use crate::tune::{
        ConsoleObserver, SearchObserver, SilentObserver, optimize_gbt, optimize_gbt_with,
        optimize_gpr, optimize_gpr_with, optimize_svr, optimize_svr_with,
    };
    pub use crate::types::Direction;
    pub use crate::visualization::OptimizationHistory;
}
