//! Datasets
//!
//! This module implements the dataset struct and various helper traits to extend its
//! functionality.
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Dimension, Ix1, Ix2, NdFloat,
};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::collections::HashMap;
use std::hash::Hash;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

mod impl_dataset;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in records of a dataset
/// and in every learned matrix.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + approx::AbsDiffEq<Epsilon = Self>
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable and hashable. Supervised learners and the constraint
/// samplers accept any label type with this bound.
pub trait Label: PartialEq + Eq + Hash + Clone {}

impl Label for bool {}
impl Label for usize {}
impl Label for String {}
impl Label for &str {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the
/// data and the supervision attached to them. The supervision is generic: supervised learners
/// read a label per record, weakly-supervised learners read a constraint container (pairs,
/// quadruplets, a similarity graph or chunklets) indexing into the records.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: labels with dimensionality (nsamples) or a constraint container
/// * `feature_names`: optional descriptive feature names with dimensionality (nfeatures)
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    feature_names: Vec<String>,
}

/// Dataset
///
/// The most commonly used typed of dataset. It contains a number of records
/// stored as an `Array2` and a label per record stored as an `Array1`.
pub type Dataset<D, T> = DatasetBase<Array2<D>, Array1<T>>;

/// DatasetView
///
/// A read only view of a Dataset
pub type DatasetView<'a, D, T> = DatasetBase<ArrayView2<'a, D>, ArrayView1<'a, T>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

impl<F, S: Data<Elem = F>, I: Dimension> Records for ArrayBase<S, I> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        self.len_of(Axis(0))
    }

    fn nfeatures(&self) -> usize {
        if self.ndim() > 1 {
            self.len_of(Axis(1))
        } else {
            1
        }
    }
}

impl<R: Records> Records for &R {
    type Elem = R::Elem;

    fn nsamples(&self) -> usize {
        (**self).nsamples()
    }

    fn nfeatures(&self) -> usize {
        (**self).nfeatures()
    }
}

impl<R: Records, T> Records for DatasetBase<R, T> {
    type Elem = R::Elem;

    fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }
}

/// Return a reference to single-target labels
pub trait AsTargets {
    type Elem;

    fn as_targets(&self) -> ArrayView1<'_, Self::Elem>;
}

impl<L, S: Data<Elem = L>> AsTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_targets(&self) -> ArrayView1<'_, L> {
        self.view()
    }
}

/// Indices of the records belonging to each distinct label, in order of first appearance
pub fn label_groups<L: Label>(labels: ArrayView1<L>) -> Vec<(L, Vec<usize>)> {
    let mut position: HashMap<L, usize> = HashMap::new();
    let mut groups: Vec<(L, Vec<usize>)> = Vec::new();

    for (idx, label) in labels.iter().enumerate() {
        match position.get(label) {
            Some(&pos) => groups[pos].1.push(idx),
            None => {
                position.insert(label.clone(), groups.len());
                groups.push((label.clone(), vec![idx]));
            }
        }
    }

    groups
}

/// Map every label to a dense class index `0..n_classes`, in order of first appearance
pub fn label_indices<L: Label>(labels: ArrayView1<L>) -> (Array1<usize>, usize) {
    let mut position: HashMap<L, usize> = HashMap::new();
    let indices = labels
        .iter()
        .map(|label| {
            let next = position.len();
            *position.entry(label.clone()).or_insert(next)
        })
        .collect::<Array1<_>>();

    (indices, position.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn groups_follow_first_appearance() {
        let labels = array![2usize, 0, 2, 1, 0];
        let groups = label_groups(labels.view());

        assert_eq!(
            groups,
            vec![(2, vec![0, 2]), (0, vec![1, 4]), (1, vec![3])]
        );
    }

    #[test]
    fn dense_label_indices() {
        let labels = array!["b", "a", "b", "c"];
        let (indices, n_classes) = label_indices(labels.view());

        assert_eq!(indices, array![0, 1, 0, 2]);
        assert_eq!(n_classes, 3);
    }

    #[test]
    fn records_dimensions() {
        let records = Array2::<f64>::zeros((5, 3));
        assert_eq!(records.nsamples(), 5);
        assert_eq!(records.nfeatures(), 3);
        assert_eq!((&records).nsamples(), 5);

        let dataset = Dataset::new(records, Array1::<usize>::zeros(5));
        assert_eq!(dataset.nsamples(), 5);
        assert_eq!(dataset.nfeatures(), 3);
    }
}
