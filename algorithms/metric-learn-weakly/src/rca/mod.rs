//! Relevant Components Analysis
//!
//! RCA whitens the data with the covariance of the variation inside chunklets, so that
//! directions along which records of the same class vary are scaled down.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
