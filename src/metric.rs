//! The contract shared by every fitted metric learner
//!
//! A fitted learner owns a transformer `L` of shape `(n_components, n_features)`. The learned
//! Mahalanobis matrix is `M = LᵀL` and the learned distance between two points is the
//! Euclidean distance of their projections `L x`.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2};

use crate::error::{Error, Result};
use crate::traits::Transformer;
use crate::{DatasetBase, Float};

/// A learned Mahalanobis metric
pub trait MahalanobisMetric<F: Float> {
    /// The linear map `L` with `M = LᵀL`
    fn transformer(&self) -> ArrayView2<'_, F>;

    /// The Mahalanobis matrix `M = LᵀL`
    fn metric(&self) -> Array2<F> {
        let l = self.transformer();
        l.t().dot(&l)
    }

    /// Output dimension of the transformer
    fn n_components(&self) -> usize {
        self.transformer().nrows()
    }

    /// Project the rows of `x` into the learned space, `X·Lᵀ`
    ///
    /// Fails if the number of features does not match the fitted transformer.
    fn transform_records<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        let l = self.transformer();
        if x.ncols() != l.ncols() {
            return Err(Error::InputShape(format!(
                "records have {} features, transformer expects {}",
                x.ncols(),
                l.ncols()
            )));
        }

        Ok(x.dot(&l.t()))
    }

    /// Learned distance `sqrt((a−b)ᵀ M (a−b))` between two points
    fn distance<D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        a: &ArrayBase<D1, Ix1>,
        b: &ArrayBase<D2, Ix1>,
    ) -> F {
        let diff = self.transformer().dot(&(a - b));
        diff.dot(&diff).sqrt()
    }

    /// Learned distances for index pairs `(i, j)` into the rows of `x`
    fn pair_distances<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        pairs: ArrayView2<usize>,
    ) -> Result<Array1<F>> {
        if pairs.ncols() != 2 {
            return Err(Error::InputShape(format!(
                "pairs need two columns, got {}",
                pairs.ncols()
            )));
        }
        if let Some(&idx) = pairs.iter().find(|&&idx| idx >= x.nrows()) {
            return Err(Error::InputShape(format!(
                "pair index {} out of range for {} records",
                idx,
                x.nrows()
            )));
        }

        let projected = self.transform_records(x)?;
        Ok(pairs.map_axis(Axis(1), |pair: ArrayView1<usize>| {
            let diff = &projected.row(pair[0]) - &projected.row(pair[1]);
            diff.dot(&diff).sqrt()
        }))
    }
}

impl<'a, F, D, M> Transformer<&'a ArrayBase<D, Ix2>, Array2<F>> for M
where
    F: Float,
    D: Data<Elem = F>,
    M: MahalanobisMetric<F>,
{
    /// Project query points into the learned space
    ///
    /// # Panics
    ///
    /// If the number of features does not match the transformer, use
    /// [`MahalanobisMetric::transform_records`] for a checked version.
    fn transform(&self, x: &'a ArrayBase<D, Ix2>) -> Array2<F> {
        x.dot(&self.transformer().t())
    }
}

impl<F, D, T, M> Transformer<DatasetBase<ArrayBase<D, Ix2>, T>, DatasetBase<Array2<F>, T>> for M
where
    F: Float,
    D: Data<Elem = F>,
    M: MahalanobisMetric<F>,
{
    /// Project the records of a dataset, for example the training set, and keep its targets
    fn transform(&self, x: DatasetBase<ArrayBase<D, Ix2>, T>) -> DatasetBase<Array2<F>, T> {
        let feature_names = (0..self.n_components())
            .map(|idx| format!("component-{}", idx))
            .collect::<Vec<_>>();
        let records = x.records.dot(&self.transformer().t());

        DatasetBase::new(records, x.targets).with_feature_names(feature_names)
    }
}

/// A plain transformer, useful to evaluate a fixed linear map or a baseline
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMetric<F> {
    transformer: Array2<F>,
}

impl<F: Float> LinearMetric<F> {
    pub fn new(transformer: Array2<F>) -> Self {
        LinearMetric { transformer }
    }

    /// The identity map, which reproduces the Euclidean distance
    pub fn euclidean(n_features: usize) -> Self {
        LinearMetric {
            transformer: Array2::eye(n_features),
        }
    }

    /// Factor a PSD Mahalanobis matrix into a transformer
    pub fn from_metric<D: Data<Elem = F>>(metric: &ArrayBase<D, Ix2>) -> Result<Self> {
        Ok(LinearMetric {
            transformer: crate::linalg::factor_metric(metric)?,
        })
    }
}

impl<F: Float> MahalanobisMetric<F> for LinearMetric<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn transform_is_projection() {
        let model = LinearMetric::new(array![[2., 0.], [1., 1.]]);
        let x = array![[1., 2.], [3., -1.]];

        let projected = model.transform(&x);
        assert_abs_diff_eq!(projected, array![[2., 3.], [6., 2.]]);
        assert_abs_diff_eq!(model.transform(&x), projected);
        assert_abs_diff_eq!(model.transform_records(&x).unwrap(), projected);
        assert!(model.transform_records(&array![[1., 2., 3.]]).is_err());
    }

    #[test]
    fn metric_and_distances() {
        let model = LinearMetric::new(array![[2., 0.], [1., 1.]]);
        assert_abs_diff_eq!(model.metric(), array![[5., 1.], [1., 1.]]);

        let x = array![[0., 0.], [1., 0.], [0., 1.]];
        let dist = model
            .pair_distances(&x, array![[0, 1], [0, 2]].view())
            .unwrap();
        assert_abs_diff_eq!(dist, array![5f64.sqrt(), 1.], epsilon = 1e-12);
        assert_abs_diff_eq!(model.distance(&x.row(0), &x.row(1)), 5f64.sqrt());
        assert!(model.pair_distances(&x, array![[0, 3]].view()).is_err());
    }

    #[test]
    fn dataset_transform_keeps_targets() {
        let model = LinearMetric::euclidean(2);
        let dataset = Dataset::new(array![[1., 2.], [3., 4.]], array![0usize, 1]);

        let projected = model.transform(dataset);
        assert_eq!(projected.targets(), &array![0, 1]);
        assert_eq!(projected.feature_names(), vec!["component-0", "component-1"]);
    }

    #[test]
    fn factored_metric_matches() {
        let m = array![[2., 1.], [1., 2.]];
        let model = LinearMetric::from_metric(&m).unwrap();
        assert_abs_diff_eq!(model.metric(), m, epsilon = 1e-10);
    }
}
