use metric_learn::constraints::Chunklets;
use metric_learn::dataset::DatasetBase;
use metric_learn::linalg::{covariance, generalized_eigh, inv_sqrtm, range_basis, regularize};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{s, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::RcaValidParams;
use crate::error::{Result, WeaklySupervisedError};

/// Fitted Relevant Components Analysis model
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn::sampling;
/// use metric_learn_weakly::Rca;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let iris = metric_learn_datasets::iris();
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
/// let chunklets = sampling::chunklets(iris.targets().view(), 30, 2, &mut rng).unwrap();
///
/// let model = Rca::params()
///     .n_components(2)
///     .fit(&DatasetBase::new(iris.records().clone(), chunklets))
///     .unwrap();
/// assert_eq!(model.transformer().dim(), (2, 4));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Rca<F> {
    transformer: Array2<F>,
}

impl<F: Float> MahalanobisMetric<F> for Rca<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

/// Chunklet members centred on their chunklet mean, with the uncentred members
fn center_chunklets<F: Float>(
    x: ArrayView2<F>,
    groups: &[Vec<usize>],
) -> (Array2<F>, Array2<F>) {
    let n_chunked = groups.iter().map(|g| g.len()).sum::<usize>();
    let mut chunked = Array2::zeros((n_chunked, x.ncols()));
    let mut centered = Array2::zeros((n_chunked, x.ncols()));

    let mut offset = 0;
    for group in groups {
        let members = x.select(Axis(0), group);
        let mean = members.sum_axis(Axis(0)) / F::cast(group.len());
        let end = offset + group.len();

        centered
            .slice_mut(s![offset..end, ..])
            .assign(&(&members - &mean));
        chunked.slice_mut(s![offset..end, ..]).assign(&members);
        offset = end;
    }

    (centered, chunked)
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, Chunklets, WeaklySupervisedError>
    for RcaValidParams<F>
{
    type Object = Rca<F>;

    /// Whiten the within-chunklet covariance
    ///
    /// A singular within-chunklet covariance, for example from duplicated features, is
    /// regularized with a small ridge. Fails with `SingularMatrix` if the chunklets show no
    /// variation at all, or if the chunked records span fewer dimensions than requested.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, Chunklets>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let chunklets = dataset.targets();
        chunklets.check_records(x.nrows())?;

        let n_features = x.ncols();
        let n_components = self.n_components().unwrap_or(n_features);
        if n_components == 0 || n_components > n_features {
            return Err(WeaklySupervisedError::InvalidComponents {
                n_components,
                n_features,
            });
        }

        let groups = chunklets.groups();
        if groups.iter().all(|g| g.len() < 2) {
            return Err(metric_learn::Error::InputShape(
                "no chunklet with at least two records".into(),
            )
            .into());
        }

        let (centered, chunked) = center_chunklets(x, &groups);
        let inner = centered.t().dot(&centered) / F::cast(centered.nrows());
        if self.verbose() {
            log::info!(
                "rca: {} chunklets covering {} records",
                groups.len(),
                chunked.nrows()
            );
        }

        let transformer = if n_components < n_features {
            let total = covariance(&chunked, 1)?;
            // only directions spanned by the chunked records can be ranked
            let basis = range_basis(&total)?;
            if basis.ncols() < n_components {
                return Err(metric_learn::Error::SingularMatrix(format!(
                    "total covariance has rank {}, below {} components",
                    basis.ncols(),
                    n_components
                ))
                .into());
            } else if basis.ncols() < n_features {
                log::warn!(
                    "rca: chunked records span {} of {} dimensions",
                    basis.ncols(),
                    n_features
                );
            }

            let (vals, vecs) = generalized_eigh(
                &basis.t().dot(&inner).dot(&basis),
                &basis.t().dot(&total).dot(&basis),
                "total covariance",
            )?;
            if self.verbose() {
                log::info!("rca: generalized eigenvalues {}", vals);
            }

            // the directions with the least within-chunklet variation
            let directions = basis.dot(&vecs.slice(s![.., ..n_components]));
            let reduced = directions.t().dot(&inner).dot(&directions);
            let reduced = regularize(&reduced, "within-chunklet covariance")?;
            inv_sqrtm(&reduced, "within-chunklet covariance")?.dot(&directions.t())
        } else {
            let inner = regularize(&inner, "within-chunklet covariance")?;
            inv_sqrtm(&inner, "within-chunklet covariance")?
        };

        Ok(Rca { transformer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use metric_learn::prelude::*;
    use ndarray::array;

    fn dataset() -> DatasetBase<Array2<f64>, Chunklets> {
        DatasetBase::new(
            array![[0., 0.], [0.2, 2.], [5., 1.], [5.4, -1.], [2., 2.]],
            Chunklets::new(array![Some(0), Some(0), Some(1), Some(1), None]),
        )
    }

    #[test]
    fn within_chunklet_covariance() {
        let x = dataset().records;
        let groups = vec![vec![0, 1], vec![2, 3]];
        let (centered, chunked) = center_chunklets(x.view(), &groups);

        assert_abs_diff_eq!(
            centered,
            array![[-0.1, -1.], [0.1, 1.], [-0.2, 1.], [0.2, -1.]],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(chunked, x.slice(s![..4, ..]));
    }

    fn inv_spd(a: &Array2<f64>) -> Array2<f64> {
        metric_learn::linalg::inv_spd(a, "inner").unwrap()
    }

    #[test]
    fn full_rank_whitens_chunklets() {
        let model = Rca::params().fit(&dataset()).unwrap();
        let inner = array![[0.025, -0.05], [-0.05, 1.]];

        let l = model.transformer();
        assert_eq!(l.dim(), (2, 2));
        assert_abs_diff_eq!(l.dot(&inner).dot(&l.t()), Array2::eye(2), epsilon = 1e-10);
        assert_abs_diff_eq!(model.metric(), inv_spd(&inner), epsilon = 1e-8);
    }

    #[test]
    fn reduced_dimension_keeps_tight_direction() {
        let model = Rca::params().n_components(1).fit(&dataset()).unwrap();
        let inner = array![[0.025, -0.05], [-0.05, 1.]];

        let l = model.transformer();
        assert_eq!(l.dim(), (1, 2));
        assert_abs_diff_eq!(l.dot(&inner).dot(&l.t()), Array2::eye(1), epsilon = 1e-10);
        // chunklets vary little along the first feature compared to the data
        assert!(l[(0, 0)].abs() > 10. * l[(0, 1)].abs());
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            Rca::params().n_components(3).fit(&dataset()),
            Err(WeaklySupervisedError::InvalidComponents { .. })
        ));
        assert!(matches!(
            Rca::params().n_components(0).fit(&dataset()),
            Err(WeaklySupervisedError::InvalidComponents { .. })
        ));

        let singletons = DatasetBase::new(
            array![[0., 0.], [1., 2.], [3., 1.]],
            Chunklets::new(array![Some(0), Some(1), None]),
        );
        assert!(matches!(
            Rca::params().fit(&singletons),
            Err(WeaklySupervisedError::BaseCrate(Error::InputShape(_)))
        ));

        let mismatch = DatasetBase::new(
            array![[0., 0.], [1., 2.]],
            Chunklets::new(array![Some(0), Some(0), None]),
        );
        assert!(matches!(
            Rca::params().fit(&mismatch),
            Err(WeaklySupervisedError::BaseCrate(Error::InputShape(_)))
        ));

        // chunklets of identical records carry no variation to whiten
        let degenerate = DatasetBase::new(
            array![[0., 0.], [0., 0.], [3., 1.], [3., 1.]],
            Chunklets::new(array![Some(0), Some(0), Some(1), Some(1)]),
        );
        for params in [Rca::params(), Rca::params().n_components(1)].iter() {
            assert!(matches!(
                params.fit(&degenerate),
                Err(WeaklySupervisedError::BaseCrate(Error::SingularMatrix(_)))
            ));
        }
    }

    #[test]
    fn duplicated_feature_is_regularized() {
        let x = dataset().records;
        let mut records = Array2::zeros((x.nrows(), 3));
        records.slice_mut(s![.., ..2]).assign(&x);
        records.column_mut(2).assign(&x.column(0));
        let dataset = DatasetBase::new(records, dataset().targets);

        let full = Rca::params().fit(&dataset).unwrap();
        assert_eq!(full.transformer().dim(), (3, 3));
        assert!(full.transformer().iter().all(|v| v.is_finite()));

        // the duplicated direction is dropped before ranking
        let model = Rca::params().n_components(2).fit(&dataset).unwrap();
        let l = model.transformer();
        let inner = array![
            [0.025, -0.05, 0.025],
            [-0.05, 1., -0.05],
            [0.025, -0.05, 0.025]
        ];
        assert_eq!(l.dim(), (2, 3));
        assert_abs_diff_eq!(l.dot(&inner).dot(&l.t()), Array2::eye(2), epsilon = 1e-8);
        assert_abs_diff_eq!(l.column(0), l.column(2), epsilon = 1e-8);
    }
}
