use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::SupervisedError;
use crate::lmnn::Lmnn;

/// Optimisation strategy of LMNN
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LmnnImpl {
    /// Gradient steps on the Mahalanobis matrix `M`, every iteration scans all impostors and
    /// projects `M` back onto the PSD cone
    Reference,
    /// Gradient steps on the transformer `L`, which keeps `M = LᵀL` PSD. Impostor candidates
    /// are only refreshed every few iterations.
    Accelerated,
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LMNN algorithm](crate::Lmnn).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LmnnValidParams<F: Float> {
    k: usize,
    learning_rate: F,
    regularization: F,
    min_iter: usize,
    max_iter: usize,
    tol: F,
    implementation: LmnnImpl,
    impostor_refresh: usize,
    verbose: bool,
}

impl<F: Float> LmnnValidParams<F> {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn regularization(&self) -> F {
        self.regularization
    }

    pub fn min_iter(&self) -> usize {
        self.min_iter
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn implementation(&self) -> LmnnImpl {
        self.implementation
    }

    pub fn impostor_refresh(&self) -> usize {
        self.impostor_refresh
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LMNN algorithm](crate::Lmnn).
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn_supervised::{Lmnn, LmnnImpl};
///
/// let iris = metric_learn_datasets::iris();
/// let model = Lmnn::params()
///     .k(5)
///     .learning_rate(1e-6)
///     .implementation(LmnnImpl::Reference)
///     .fit(&iris)
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LmnnParams<F: Float>(LmnnValidParams<F>);

impl<F: Float> Default for LmnnParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Lmnn<F> {
    pub fn params() -> LmnnParams<F> {
        LmnnParams::new()
    }
}

impl<F: Float> LmnnParams<F> {
    /// Create new LMNN parameters with default values
    ///
    /// * `k = 3`
    /// * `learning_rate = 1e-7`
    /// * `regularization = 0.5`
    /// * `min_iter = 50`, `max_iter = 1000`
    /// * `tol = 1e-3`
    /// * `implementation = LmnnImpl::Accelerated`, refreshing impostors every 10 iterations
    pub fn new() -> Self {
        Self(LmnnValidParams {
            k: 3,
            learning_rate: F::cast(1e-7),
            regularization: F::cast(0.5),
            min_iter: 50,
            max_iter: 1000,
            tol: F::cast(1e-3),
            implementation: LmnnImpl::Accelerated,
            impostor_refresh: 10,
            verbose: false,
        })
    }

    /// Set the number of target neighbours per point
    pub fn k(mut self, k: usize) -> Self {
        self.0.k = k;
        self
    }

    /// Set the initial step size, it is adapted during the run
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the weight of the pull term, the push term gets `1 - regularization`
    pub fn regularization(mut self, regularization: F) -> Self {
        self.0.regularization = regularization;
        self
    }

    /// Set the number of iterations before the tolerance is checked
    pub fn min_iter(mut self, min_iter: usize) -> Self {
        self.0.min_iter = min_iter;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the tolerance on the decrease of the objective
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    pub fn implementation(mut self, implementation: LmnnImpl) -> Self {
        self.0.implementation = implementation;
        self
    }

    /// Set after how many iterations the accelerated solver rescans for impostors
    pub fn impostor_refresh(mut self, impostor_refresh: usize) -> Self {
        self.0.impostor_refresh = impostor_refresh;
        self
    }

    /// Log the objective of every iteration
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LmnnParams<F> {
    type Checked = LmnnValidParams<F>;
    type Error = SupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.k == 0 {
            Err(SupervisedError::InvalidNeighbours(self.0.k))
        } else if self.0.learning_rate.is_nan() || self.0.learning_rate <= F::zero() {
            Err(SupervisedError::InvalidLearningRate(
                self.0.learning_rate.to_f32().unwrap_or(f32::NAN),
            ))
        } else if !(self.0.regularization >= F::zero() && self.0.regularization <= F::one()) {
            Err(SupervisedError::InvalidRegularization(
                self.0.regularization.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.tol.is_nan() || self.0.tol < F::zero() {
            Err(SupervisedError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.min_iter > self.0.max_iter {
            Err(SupervisedError::InvalidIterations {
                min_iter: self.0.min_iter,
                max_iter: self.0.max_iter,
            })
        } else if self.0.impostor_refresh == 0 {
            Err(SupervisedError::InvalidRefresh)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
