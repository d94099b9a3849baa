use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::SupervisedError;
use crate::nca::Nca;

/// How the gradient of a pass over the data is applied
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NcaUpdate {
    /// Visit the points in data order and apply the contribution of every point immediately
    Sweep,
    /// Accumulate the contributions of all points and apply them once per pass
    Batch,
}

/// The set of hyperparameters that can be specified for the execution of
/// the [NCA algorithm](crate::Nca).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct NcaValidParams<F: Float> {
    learning_rate: F,
    max_iter: usize,
    n_components: Option<usize>,
    tol: F,
    update: NcaUpdate,
    verbose: bool,
}

impl<F: Float> NcaValidParams<F> {
    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn update(&self) -> NcaUpdate {
        self.update
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [NCA algorithm](crate::Nca).
#[derive(Debug, Clone, PartialEq)]
pub struct NcaParams<F: Float>(NcaValidParams<F>);

impl<F: Float> Default for NcaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Nca<F> {
    pub fn params() -> NcaParams<F> {
        NcaParams::new()
    }
}

impl<F: Float> NcaParams<F> {
    /// Create new NCA parameters with a learning rate of `0.01`, `100` passes, all components
    /// and the sweeping update
    pub fn new() -> Self {
        Self(NcaValidParams {
            learning_rate: F::cast(0.01),
            max_iter: 100,
            n_components: None,
            tol: F::cast(1e-10),
            update: NcaUpdate::Sweep,
            verbose: false,
        })
    }

    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the number of passes over the data
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the output dimension, if not set all features are kept
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.0.n_components = Some(n_components);
        self
    }

    /// Set the tolerance on the norm of the gradient of a pass
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    pub fn update(mut self, update: NcaUpdate) -> Self {
        self.0.update = update;
        self
    }

    /// Log the objective after every pass
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for NcaParams<F> {
    type Checked = NcaValidParams<F>;
    type Error = SupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.learning_rate.is_nan() || self.0.learning_rate <= F::zero() {
            Err(SupervisedError::InvalidLearningRate(
                self.0.learning_rate.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.tol.is_nan() || self.0.tol < F::zero() {
            Err(SupervisedError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(f32::NAN),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
