use metric_learn::dataset::label_indices;
use metric_learn::prelude::*;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2};

use crate::error::{Result, SupervisedError};

/// Labels of a supervised dataset, reduced to dense class ids
pub(crate) struct Classes {
    pub class_of: Array1<usize>,
    pub members: Vec<Vec<usize>>,
}

impl Classes {
    /// Check the labels against the records and group the records by class
    pub fn from_dataset<F: Float, D: Data<Elem = F>, L: Label>(
        records: &ArrayBase<D, Ix2>,
        labels: ArrayView1<L>,
    ) -> Result<Self> {
        if records.nrows() != labels.len() {
            return Err(Error::InputShape(format!(
                "{} records with {} labels",
                records.nrows(),
                labels.len()
            ))
            .into());
        }
        if records.nrows() < 2 {
            return Err(Error::NotEnoughSamples(format!(
                "metric learning needs at least two records, got {}",
                records.nrows()
            ))
            .into());
        }

        let (class_of, n_classes) = label_indices(labels);
        let mut members = vec![Vec::new(); n_classes];
        for (idx, class) in class_of.iter().enumerate() {
            members[*class].push(idx);
        }

        Ok(Classes { class_of, members })
    }

    pub fn same(&self, a: usize, b: usize) -> bool {
        self.class_of[a] == self.class_of[b]
    }
}

/// Check a requested output dimension, `None` keeps all features
pub(crate) fn check_components(n_components: Option<usize>, n_features: usize) -> Result<usize> {
    match n_components {
        None => Ok(n_features),
        Some(k) if k > 0 && k <= n_features => Ok(k),
        Some(k) => Err(SupervisedError::InvalidComponents {
            n_components: k,
            n_features,
        }),
    }
}

/// Squared Euclidean distance of two rows
pub(crate) fn sq_dist<F: Float>(a: ArrayView1<F>, b: ArrayView1<F>) -> F {
    a.iter()
        .zip(b.iter())
        .map(|(u, v)| (*u - *v) * (*u - *v))
        .sum()
}

/// Matrix of squared Euclidean distances between all rows
pub(crate) fn sq_distances<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>) -> Array2<F> {
    let n = x.nrows();
    let mut dist = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = sq_dist(x.row(i), x.row(j));
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }

    dist
}

/// Rows of `x` at the given indices
pub(crate) fn select_rows<F: Float, D: Data<Elem = F>>(
    x: &ArrayBase<D, Ix2>,
    indices: &[usize],
) -> Array2<F> {
    x.select(Axis(0), indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn classes_are_grouped() {
        let x = array![[0., 0.], [1., 1.], [2., 2.]];
        let classes = Classes::from_dataset(&x, array!["b", "a", "b"].view()).unwrap();

        assert_eq!(classes.members, vec![vec![0, 2], vec![1]]);
        assert!(classes.same(0, 2));
        assert!(!classes.same(0, 1));

        assert!(Classes::from_dataset(&x, array!["a", "b"].view()).is_err());
        assert!(Classes::from_dataset(&x.slice(ndarray::s![..1, ..]), array!["a"].view()).is_err());
    }

    #[test]
    fn components_range() {
        assert_eq!(check_components(None, 4).unwrap(), 4);
        assert_eq!(check_components(Some(2), 4).unwrap(), 2);
        assert!(check_components(Some(0), 4).is_err());
        assert!(check_components(Some(5), 4).is_err());
    }

    #[test]
    fn squared_distances() {
        let x = array![[0., 0.], [3., 4.], [0., 1.]];
        let dist = sq_distances(&x);
        assert_abs_diff_eq!(dist, array![[0., 25., 1.], [25., 0., 18.], [1., 18., 0.]]);
    }
}
