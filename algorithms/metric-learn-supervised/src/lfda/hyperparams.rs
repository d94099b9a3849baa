use metric_learn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::error::SupervisedError;
use crate::lfda::Lfda;

/// Post-processing of the generalized eigenvectors
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LfdaEmbedding {
    /// Scale every eigenvector by the square root of its eigenvalue
    Weighted,
    /// Orthonormalise the eigenvectors
    Orthonormalized,
    /// Keep the eigenvectors as returned by the solver
    Plain,
}

/// Bandwidth `σ_i` of the affinity `exp(−‖x_i − x_j‖² / (σ_i σ_j))`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LocalScale {
    /// Distance to the `k`-th nearest neighbour of the same class
    KthNeighbor,
    /// Root mean squared distance to the other members of the class, ignores `k`
    ClassSpread,
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LFDA algorithm](crate::Lfda).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LfdaValidParams<F> {
    n_components: Option<usize>,
    k: usize,
    embedding: LfdaEmbedding,
    local_scale: LocalScale,
    verbose: bool,
    phantom: PhantomData<F>,
}

impl<F: Float> LfdaValidParams<F> {
    pub fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn embedding(&self) -> LfdaEmbedding {
        self.embedding
    }

    pub fn local_scale(&self) -> LocalScale {
        self.local_scale
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// The set of hyperparameters that can be specified for the execution of
/// the [LFDA algorithm](crate::Lfda).
#[derive(Debug, Clone, PartialEq)]
pub struct LfdaParams<F>(LfdaValidParams<F>);

impl<F: Float> Default for LfdaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Lfda<F> {
    pub fn params() -> LfdaParams<F> {
        LfdaParams::new()
    }
}

impl<F: Float> LfdaParams<F> {
    /// Create new LFDA parameters with default values
    ///
    /// * all components are kept
    /// * `local_scale = LocalScale::ClassSpread`
    /// * `k = 7`, used by `LocalScale::KthNeighbor` only
    /// * `embedding = LfdaEmbedding::Weighted`
    pub fn new() -> Self {
        Self(LfdaValidParams {
            n_components: None,
            k: 7,
            embedding: LfdaEmbedding::Weighted,
            local_scale: LocalScale::ClassSpread,
            verbose: false,
            phantom: PhantomData,
        })
    }

    /// Set the output dimension
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.0.n_components = Some(n_components);
        self
    }

    /// Set the neighbour used by the `KthNeighbor` local scaling
    pub fn k(mut self, k: usize) -> Self {
        self.0.k = k;
        self
    }

    pub fn embedding(mut self, embedding: LfdaEmbedding) -> Self {
        self.0.embedding = embedding;
        self
    }

    pub fn local_scale(mut self, local_scale: LocalScale) -> Self {
        self.0.local_scale = local_scale;
        self
    }

    /// Log the eigenvalues of the kept components
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LfdaParams<F> {
    type Checked = LfdaValidParams<F>;
    type Error = SupervisedError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.k == 0 {
            Err(SupervisedError::InvalidNeighbours(self.0.k))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
