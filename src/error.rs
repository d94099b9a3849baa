//! Error types in metric-learn
//!

use thiserror::Error;

use linfa_linalg::LinalgError;
use ndarray::ShapeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    /// Dimensions of records, targets or constraints do not agree
    #[error("invalid input shape: {0}")]
    InputShape(String),
    #[error("not enough samples: {0}")]
    NotEnoughSamples(String),
    /// A covariance, Laplacian or scatter matrix could not be inverted
    #[error("singular matrix: {0}")]
    SingularMatrix(String),
    /// A decomposition produced non-finite values or a PSD projection failed
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}
