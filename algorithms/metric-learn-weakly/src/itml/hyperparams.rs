use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::WeaklySupervisedError;
use crate::itml::Itml;

/// The set of hyperparameters that can be specified for the execution of
/// the [ITML algorithm](crate::Itml).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ItmlValidParams<F: Float> {
    gamma: F,
    max_iter: usize,
    convergence_threshold: F,
    bounds: Option<(F, F)>,
    verbose: bool,
}

impl<F: Float> ItmlValidParams<F> {
    pub fn gamma(&self) -> F {
        self.gamma
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn convergence_threshold(&self) -> F {
        self.convergence_threshold
    }

    /// Distance bounds for similar and dissimilar pairs, estimated from the data if not set
    pub fn bounds(&self) -> Option<(F, F)> {
        self.bounds
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [ITML algorithm](crate::Itml).
#[derive(Debug, Clone, PartialEq)]
pub struct ItmlParams<F: Float>(ItmlValidParams<F>);

impl<F: Float> Default for ItmlParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Itml<F> {
    pub fn params() -> ItmlParams<F> {
        ItmlParams::new()
    }
}

impl<F: Float> ItmlParams<F> {
    /// Create new ITML parameters with slack `1`, at most `1000` sweeps, a convergence
    /// threshold of `1e-3` and bounds estimated from the data
    pub fn new() -> Self {
        Self(ItmlValidParams {
            gamma: F::one(),
            max_iter: 1000,
            convergence_threshold: F::cast(1e-3),
            bounds: None,
            verbose: false,
        })
    }

    /// Set the slack, larger values enforce the bounds more strictly
    pub fn gamma(mut self, gamma: F) -> Self {
        self.0.gamma = gamma;
        self
    }

    /// Set the maximal number of sweeps over all pairs
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    pub fn convergence_threshold(mut self, convergence_threshold: F) -> Self {
        self.0.convergence_threshold = convergence_threshold;
        self
    }

    /// Fix the upper distance bound of similar pairs and the lower distance bound of
    /// dissimilar pairs
    ///
    /// By default they are the 5th and 95th percentile of the distances between distinct
    /// records.
    pub fn bounds(mut self, similar: F, dissimilar: F) -> Self {
        self.0.bounds = Some((similar, dissimilar));
        self
    }

    /// Log the convergence measure after every sweep
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for ItmlParams<F> {
    type Checked = ItmlValidParams<F>;
    type Error = WeaklySupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.gamma.is_nan() || self.0.gamma <= F::zero() {
            return Err(WeaklySupervisedError::InvalidGamma(
                self.0.gamma.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if self.0.convergence_threshold.is_nan() || self.0.convergence_threshold < F::zero() {
            return Err(WeaklySupervisedError::InvalidTolerance(
                self.0.convergence_threshold.to_f32().unwrap_or(f32::NAN),
            ));
        }

        match self.0.bounds {
            Some((similar, dissimilar))
                if similar.is_nan()
                    || dissimilar.is_nan()
                    || similar <= F::zero()
                    || dissimilar <= F::zero() =>
            {
                Err(WeaklySupervisedError::InvalidBounds {
                    similar: similar.to_f32().unwrap_or(f32::NAN),
                    dissimilar: dissimilar.to_f32().unwrap_or(f32::NAN),
                })
            }
            _ => Ok(&self.0),
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
