//! Sampler trait and implementations for hyperparameter sampling.

pub mod random;
pub mod tpe;

mod common;

use std::collections::HashMap;

use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::types::Direction;

/// A completed trial with its sampled hyperparameters and objective value.
///
/// This struct stores the results of a completed trial: every sampled
/// hyperparameter value keyed by name, the distribution it was drawn from,
/// and the fitness returned by the objective function. Completed trials are
/// never mutated; samplers read them to bias future proposals.
#[derive(Clone, Debug)]
pub struct CompletedTrial {
    /// The unique identifier for this trial.
    pub id: u64,
    /// The sampled hyperparameter values, keyed by name.
    pub params: HashMap<String, ParamValue>,
    /// The distributions the hyperparameters were drawn from, keyed by name.
    pub distributions: HashMap<String, Distribution>,
    /// The objective value returned by the objective function.
    pub value: f64,
}

impl CompletedTrial {
    /// Creates a new completed trial.
    #[must_use]
    pub fn new(
        id: u64,
        params: HashMap<String, ParamValue>,
        distributions: HashMap<String, Distribution>,
        value: f64,
    ) -> Self {
        Self {
            id,
            params,
            distributions,
            value,
        }
    }

    /// Returns the recorded floating-point value of the named hyperparameter.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownParameter` if the name was never sampled and
    /// `Error::ParameterType` if it holds a non-float value.
    pub fn float(&self, name: &str) -> Result<f64> {
        match self.params.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(_) => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "float",
            }),
            None => Err(Error::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the recorded integer value of the named hyperparameter.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownParameter` if the name was never sampled and
    /// `Error::ParameterType` if it holds a non-integer value.
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.params.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(_) => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "integer",
            }),
            None => Err(Error::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the recorded choice index of the named categorical hyperparameter.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownParameter` if the name was never sampled and
    /// `Error::ParameterType` if it holds a non-categorical value.
    pub fn categorical(&self, name: &str) -> Result<usize> {
        match self.params.get(name) {
            Some(ParamValue::Categorical(v)) => Ok(*v),
            Some(_) => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "categorical",
            }),
            None => Err(Error::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }
}

/// Trait for pluggable hyperparameter proposal strategies.
///
/// A sampler proposes the next value for one named hyperparameter given its
/// distribution and the full history of completed trials. The history is how
/// results are recorded back into the sampler: adaptive implementations such
/// as [`TpeSampler`](tpe::TpeSampler) use it to bias proposals toward
/// higher-scoring regions, while [`RandomSampler`](random::RandomSampler)
/// ignores it.
///
/// The trait requires `Send + Sync` so fitted models built from sampled
/// configurations can be scored on parallel cross-validation folds.
pub trait Sampler: Send + Sync {
    /// Proposes a value for the named hyperparameter.
    ///
    /// # Arguments
    ///
    /// * `name` - The hyperparameter name; history lookups are keyed by it.
    /// * `distribution` - The distribution to sample from.
    /// * `direction` - Whether lower or higher objective values are better.
    /// * `trial_id` - The unique ID of the trial being sampled for.
    /// * `history` - Completed trials recorded so far, in chronological order.
    fn sample(
        &self,
        name: &str,
        distribution: &Distribution,
        direction: Direction,
        trial_id: u64,
        history: &[CompletedTrial],
    ) -> ParamValue;
}
