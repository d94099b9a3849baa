use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::WeaklySupervisedError;
use crate::sdml::Sdml;

/// The set of hyperparameters that can be specified for the execution of
/// the [SDML algorithm](crate::Sdml).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SdmlValidParams<F: Float> {
    balance_param: F,
    sparsity_param: F,
    use_cov: bool,
    max_iter: usize,
    tol: F,
    verbose: bool,
}

impl<F: Float> SdmlValidParams<F> {
    pub fn balance_param(&self) -> F {
        self.balance_param
    }

    pub fn sparsity_param(&self) -> F {
        self.sparsity_param
    }

    pub fn use_cov(&self) -> bool {
        self.use_cov
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [SDML algorithm](crate::Sdml).
#[derive(Debug, Clone, PartialEq)]
pub struct SdmlParams<F: Float>(SdmlValidParams<F>);

impl<F: Float> Default for SdmlParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Sdml<F> {
    pub fn params() -> SdmlParams<F> {
        SdmlParams::new()
    }
}

impl<F: Float> SdmlParams<F> {
    /// Create new SDML parameters
    ///
    /// Defaults are a balance of `1e-3` between prior and graph, a sparsity penalty of `0.01`,
    /// the covariance prior and at most `100` graphical lasso sweeps with a dual gap
    /// tolerance of `1e-4`.
    pub fn new() -> Self {
        Self(SdmlValidParams {
            balance_param: F::cast(1e-3),
            sparsity_param: F::cast(0.01),
            use_cov: true,
            max_iter: 100,
            tol: F::cast(1e-4),
            verbose: false,
        })
    }

    /// Set the weight of the graph Laplacian term against the prior
    pub fn balance_param(mut self, balance_param: F) -> Self {
        self.0.balance_param = balance_param;
        self
    }

    /// Set the L1 penalty on the off-diagonal entries of the metric
    pub fn sparsity_param(mut self, sparsity_param: F) -> Self {
        self.0.sparsity_param = sparsity_param;
        self
    }

    /// Use the covariance of the records as prior, otherwise the identity
    pub fn use_cov(mut self, use_cov: bool) -> Self {
        self.0.use_cov = use_cov;
        self
    }

    /// Set the maximal number of graphical lasso sweeps
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the tolerance on the dual gap of the graphical lasso
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for SdmlParams<F> {
    type Checked = SdmlValidParams<F>;
    type Error = WeaklySupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.balance_param.is_nan() || self.0.balance_param < F::zero() {
            Err(WeaklySupervisedError::InvalidBalance(
                self.0.balance_param.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.sparsity_param.is_nan() || self.0.sparsity_param < F::zero() {
            Err(WeaklySupervisedError::InvalidSparsity(
                self.0.sparsity_param.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.tol.is_nan() || self.0.tol < F::zero() {
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
