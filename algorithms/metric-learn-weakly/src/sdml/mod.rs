//! Sparse Determinant Metric Learning
//!
//! SDML regularises the metric towards a prior with a LogDet divergence and an L1 penalty on
//! its off-diagonal entries. The supervision is a signed similarity graph over the records,
//! its Laplacian turns the pull of similar and the push of dissimilar pairs into a single
//! `d×d` matrix. The sparse metric itself is found by the graphical lasso.
mod algorithm;
mod glasso;
mod hyperparams;

pub use algorithm::*;
pub use glasso::graphical_lasso;
pub use hyperparams::*;
