//! Least Squared-residual Metric Learning
//!
//! LSML learns from relative comparisons `d(a, b) < d(c, d)`. Every violated comparison is
//! penalised with the squared difference of the two distances, the metric is kept close to a
//! prior by a LogDet divergence.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
