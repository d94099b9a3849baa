use linfa_linalg::LinalgError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupervisedError>;

/// An error when fitting a supervised metric learner
#[derive(Error, Debug)]
pub enum SupervisedError {
    /// The number of target neighbours must be positive
    #[error("number of neighbours should be positive but is {0}")]
    InvalidNeighbours(usize),
    #[error("learning rate should be positive but is {0}")]
    InvalidLearningRate(f32),
    #[error("regularization should be in [0, 1] but is {0}")]
    InvalidRegularization(f32),
    #[error("tolerance should be non-negative but is {0}")]
    InvalidTolerance(f32),
    #[error("minimal number of iterations {min_iter} exceeds maximal number {max_iter}")]
    InvalidIterations { min_iter: usize, max_iter: usize },
    #[error("impostor refresh interval should be positive")]
    InvalidRefresh,
    /// The output dimension is zero or larger than the number of features
    #[error("number of components {n_components} out of range for {n_features} features")]
    InvalidComponents {
        n_components: usize,
        n_features: usize,
    },
    /// A class has not enough members to find its target neighbours
    #[error("class with {size} points cannot provide {k} target neighbours")]
    ClassTooSmall { size: usize, k: usize },
    #[error(transparent)]
    LinalgError(#[from] LinalgError),
    #[error(transparent)]
    BaseCrate(#[from] metric_learn::Error),
}
