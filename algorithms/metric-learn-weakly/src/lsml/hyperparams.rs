use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::WeaklySupervisedError;
use crate::lsml::Lsml;

/// Prior Mahalanobis matrix, also the starting point of the descent
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LsmlPrior {
    /// Sample covariance of the records, regularized with a small ridge if singular
    Covariance,
    /// The Euclidean distance
    Identity,
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LSML algorithm](crate::Lsml).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LsmlValidParams<F: Float> {
    prior: LsmlPrior,
    tol: F,
    max_iter: usize,
    verbose: bool,
}

impl<F: Float> LsmlValidParams<F> {
    pub fn prior(&self) -> LsmlPrior {
        self.prior
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LSML algorithm](crate::Lsml).
#[derive(Debug, Clone, PartialEq)]
pub struct LsmlParams<F: Float>(LsmlValidParams<F>);

impl<F: Float> Default for LsmlParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Lsml<F> {
    pub fn params() -> LsmlParams<F> {
        LsmlParams::new()
    }
}

impl<F: Float> LsmlParams<F> {
    /// Create new LSML parameters with the covariance prior, a tolerance of `1e-3` and at most
    /// `1000` iterations
    pub fn new() -> Self {
        Self(LsmlValidParams {
            prior: LsmlPrior::Covariance,
            tol: F::cast(1e-3),
            max_iter: 1000,
            verbose: false,
        })
    }

    pub fn prior(mut self, prior: LsmlPrior) -> Self {
        self.0.prior = prior;
        self
    }

    /// Set the tolerance on the gradient norm and on the decrease of the loss
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Log the loss after every accepted step
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LsmlParams<F> {
    type Checked = LsmlValidParams<F>;
    type Error = WeaklySupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.tol.is_nan() || self.0.tol < F::zero() {
            Err(WeaklySupervisedError::InvalidTolerance(
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
