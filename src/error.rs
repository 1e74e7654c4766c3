#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the feature matrix and target vector disagree on sample count.
    #[error(
        "inconsistent number of samples: {features} in the feature matrix, {targets} in the target vector"
    )]
    SampleCountMismatch {
        /// Number of rows in the feature matrix.
        features: usize,
        /// Number of entries in the target vector.
        targets: usize,
    },

    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when categorical choices are empty.
    #[error("categorical choices cannot be empty")]
    EmptyChoices,

    /// Returned when a parameter is suggested with a different configuration.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// Returned when reading a parameter that was never sampled in a trial.
    #[error("unknown parameter '{name}': not sampled in this trial")]
    UnknownParameter {
        /// The requested parameter name.
        name: String,
    },

    /// Returned when a recorded parameter value has a different kind than requested.
    #[error("parameter '{name}' is not a {expected} parameter")]
    ParameterType {
        /// The requested parameter name.
        name: String,
        /// The expected parameter kind.
        expected: &'static str,
    },

    /// Returned when requesting the best trial but no trials have completed.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// Returned when the dataset has fewer samples than cross-validation folds.
    #[error("cannot split {n_samples} samples into {n_splits} cross-validation folds")]
    InsufficientSamples {
        /// Number of available samples.
        n_samples: usize,
        /// Number of requested folds.
        n_splits: usize,
    },

    /// Returned when gamma is not in the valid range (0.0, 1.0).
    #[error("invalid gamma: {0} must be in (0.0, 1.0)")]
    InvalidGamma(f64),

    /// Returned when bandwidth is not positive.
    #[error("invalid bandwidth: {0} must be positive")]
    InvalidBandwidth(f64),

    /// Returned when fitting a model on an empty training set.
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    /// Returned when predicting with a model that has not been fitted.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when the Gaussian-process kernel matrix cannot be factorized.
    #[error("kernel matrix is not positive definite (try a larger noise floor)")]
    KernelFactorization,
}

pub type Result<T> = core::result::Result<T, Error>;
