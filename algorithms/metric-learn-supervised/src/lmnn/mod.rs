//! Large Margin Nearest Neighbor
//!
//! LMNN learns a metric under which every point is surrounded by its `k` target neighbours,
//! its nearest points of the same class, while points of other classes (impostors) are kept
//! at least a unit margin further away. The objective mixes a pull term on the target
//! neighbours with a hinge loss on the impostors.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
