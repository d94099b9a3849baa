use linfa_linalg::LinalgError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeaklySupervisedError>;

/// An error when fitting a weakly-supervised metric learner
#[derive(Error, Debug)]
pub enum WeaklySupervisedError {
    #[error("tolerance should be non-negative but is {0}")]
    InvalidTolerance(f32),
    /// The slack of ITML must be positive
    #[error("slack gamma should be positive but is {0}")]
    InvalidGamma(f32),
    /// Distance bounds must be positive
    #[error("invalid distance bounds, similar {similar} and dissimilar {dissimilar}")]
    InvalidBounds { similar: f32, dissimilar: f32 },
    #[error("balance parameter should be non-negative but is {0}")]
    InvalidBalance(f32),
    #[error("sparsity parameter should be non-negative but is {0}")]
    InvalidSparsity(f32),
    /// The output dimension is zero or larger than the number of features
    #[error("number of components {n_components} out of range for {n_features} features")]
    InvalidComponents {
        n_components: usize,
        n_features: usize,
    },
    /// Nothing to learn from
    #[error("no usable constraints: {0}")]
    NoConstraints(String),
    #[error(transparent)]
    LinalgError(#[from] LinalgError),
    #[error(transparent)]
    BaseCrate(#[from] metric_learn::Error),
}
