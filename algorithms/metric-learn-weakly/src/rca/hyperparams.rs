use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::error::WeaklySupervisedError;
use crate::rca::Rca;

/// The set of hyperparameters that can be specified for the execution of
/// the [RCA algorithm](crate::Rca).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RcaValidParams<F: Float> {
    n_components: Option<usize>,
    verbose: bool,
    phantom: PhantomData<F>,
}

impl<F: Float> RcaValidParams<F> {
    pub fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [RCA algorithm](crate::Rca).
#[derive(Debug, Clone, PartialEq)]
pub struct RcaParams<F: Float>(RcaValidParams<F>);

impl<F: Float> Default for RcaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Rca<F> {
    pub fn params() -> RcaParams<F> {
        RcaParams::new()
    }
}

impl<F: Float> RcaParams<F> {
    /// Create new RCA parameters keeping all components
    pub fn new() -> Self {
        Self(RcaValidParams {
            n_components: None,
            verbose: false,
            phantom: PhantomData,
        })
    }

    /// Set the output dimension, the directions with the least within-chunklet variation
    /// relative to the total variation are kept
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.0.n_components = Some(n_components);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for RcaParams<F> {
    type Checked = RcaValidParams<F>;
    type Error = WeaklySupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
