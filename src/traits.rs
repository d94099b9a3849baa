//! Provide traits for different classes of algorithms
//!

use crate::dataset::{DatasetBase, Records};
use std::convert::From;

/// Transformation algorithms
///
/// A transformer takes a dataset or a matrix and returns a transformed version of it. For
/// metric learners this is the projection `X·Lᵀ` into the learned space.
pub trait Transformer<R: Records, T> {
    fn transform(&self, x: R) -> T;
}

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For
/// example in metric learning the `fit` method learns a Mahalanobis metric from labels or
/// constraints and returns the fitted model.
///
/// The fitted model is a fresh value, so a failing `fit` never touches a model obtained from
/// an earlier call.
pub trait Fit<R: Records, T, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E>;
}
