//! Information Theoretic Metric Learning
//!
//! ITML keeps the learned metric as close as possible to the Euclidean prior in LogDet
//! divergence while similar pairs stay below an upper distance bound and dissimilar pairs
//! above a lower one. The problem is solved with cyclic Bregman projections, each a rank-one
//! update of the metric.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
