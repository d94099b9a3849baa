//! Neighbourhood Components Analysis
//!
//! NCA maximises the expected number of correctly classified points of a stochastic nearest
//! neighbour classifier in the learned space. Every point picks a neighbour with probability
//! given by a softmax over the negative squared distances, the transformer follows the
//! gradient of the probability to pick a neighbour of the same class.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
