use metric_learn::dataset::DatasetBase;
use metric_learn::graph::SimilarityGraph;
use metric_learn::linalg::{
    clip_eigenvalues, covariance, eigh_sorted, factor_metric, inv_spd, is_positive_definite,
    pinvh, range_basis, symmetrize,
};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::glasso::graphical_lasso;
use super::hyperparams::SdmlValidParams;
use crate::error::{Result, WeaklySupervisedError};

/// Indefinite matrices are clipped to this fraction of their largest eigenvalue
const EIGENVALUE_FLOOR: f64 = 1e-3;

/// Fitted Sparse Determinant Metric Learning model
///
/// The supervision is any [`SimilarityGraph`], a dense `ndarray` matrix or a sparse
/// `sprs::CsMat` lead to the same model.
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn::sampling;
/// use metric_learn_weakly::Sdml;
/// use ndarray::Array2;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let iris = metric_learn_datasets::iris();
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
/// let graph: Array2<f64> =
///     sampling::adjacency_matrix(iris.targets().view(), 1500, &mut rng).unwrap();
///
/// let model = Sdml::params()
///     .fit(&DatasetBase::new(iris.records().clone(), graph))
///     .unwrap();
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Sdml<F> {
    transformer: Array2<F>,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> Sdml<F> {
    /// Number of graphical lasso sweeps
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float> MahalanobisMetric<F> for Sdml<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

impl<F, D, G> Fit<ArrayBase<D, Ix2>, G, WeaklySupervisedError> for SdmlValidParams<F>
where
    F: Float,
    D: Data<Elem = F>,
    G: SimilarityGraph<Elem = F>,
{
    type Object = Sdml<F>;

    /// Estimate a sparse precision matrix from the prior and the graph
    ///
    /// A rank deficient covariance prior is pseudo-inverted. Fails with `SingularMatrix` if
    /// the prior plus graph term has no positive eigenvalue left to clip against.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, G>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let graph = dataset.targets();
        graph.check_nodes(x.nrows())?;
        if graph.n_edges() == 0 {
            return Err(WeaklySupervisedError::NoConstraints(
                "similarity graph has no edges".into(),
            ));
        }

        let prior_inv = if self.use_cov() {
            let cov = covariance(&x, 1)?;
            let rank = range_basis(&cov)?.ncols();
            if rank < x.ncols() {
                log::warn!(
                    "sdml: covariance of the records has rank {} of {}, using its pseudo-inverse",
                    rank,
                    x.ncols()
                );
                pinvh(&cov)?
            } else {
                inv_spd(&cov, "covariance of the records")?
            }
        } else {
            Array2::eye(x.ncols())
        };

        let laplacian = graph.laplacian_form(&x);
        let mut emp_cov = symmetrize(&(prior_inv + laplacian * self.balance_param()));
        let (vals, _) = eigh_sorted(&emp_cov)?;
        let largest = match vals.iter().next_back() {
            Some(&largest) if largest > F::zero() => largest,
            _ => {
                return Err(metric_learn::Error::SingularMatrix(
                    "prior plus graph term has no positive eigenvalue".into(),
                )
                .into())
            }
        };
        if vals[0] < largest * F::epsilon().sqrt() || !is_positive_definite(&emp_cov) {
            log::warn!(
                "sdml: prior plus graph term is not positive definite, clipping {} eigenvalues",
                vals.iter()
                    .filter(|v| **v < largest * F::cast(EIGENVALUE_FLOOR))
                    .count()
            );
            emp_cov = clip_eigenvalues(&emp_cov, largest * F::cast(EIGENVALUE_FLOOR))?;
        }
        if self.verbose() {
            log::info!(
                "sdml: {} edges, {} graph",
                graph.n_edges(),
                if graph.is_sparse() { "sparse" } else { "dense" }
            );
        }

        let (metric, n_iter, converged) =
            graphical_lasso(&emp_cov, self.sparsity_param(), self.max_iter(), self.tol())?;
        if !converged {
            log::warn!(
                "sdml: graphical lasso did not converge within {} sweeps",
                self.max_iter()
            );
        }

        Ok(Sdml {
            transformer: factor_metric(&metric)?,
            n_iter,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use approx::assert_abs_diff_eq;
    use metric_learn::prelude::*;
    use ndarray::array;
    use sprs::{CsMat, TriMat};

    fn records() -> Array2<f64> {
        array![
            [0., 0.],
            [0.1, 3.],
            [0.2, -3.],
            [5., 0.5],
            [5.1, -2.5],
            [4.9, 2.8],
        ]
    }

    /// Similar pairs inside the two groups, dissimilar pairs across
    fn graph() -> Array2<f64> {
        let mut graph = Array2::zeros((6, 6));
        for &(i, j, w) in &[
            (0, 1, 1.),
            (1, 2, 1.),
            (3, 4, 1.),
            (4, 5, 1.),
            (0, 3, -1.),
            (1, 4, -1.),
            (2, 5, -1.),
        ] {
            graph[(i, j)] = w;
            graph[(j, i)] = w;
        }

        graph
    }

    fn to_sparse(dense: &Array2<f64>) -> CsMat<f64> {
        let mut tri = TriMat::new(dense.dim());
        for ((i, j), w) in dense.indexed_iter() {
            if *w != 0. {
                tri.add_triplet(i, j, *w);
            }
        }

        tri.to_csr()
    }

    #[test]
    fn dense_and_sparse_graph_agree() -> Result<()> {
        let params = Sdml::params().balance_param(0.1).use_cov(false);

        let dense = params.fit(&DatasetBase::new(records(), graph()))?;
        let sparse = params.fit(&DatasetBase::new(records(), to_sparse(&graph())))?;

        assert_abs_diff_eq!(dense.metric(), sparse.metric(), epsilon = 1e-8);
        assert_eq!(dense.n_iter(), sparse.n_iter());
        Ok(())
    }

    #[test]
    fn graph_shrinks_noise_direction() -> Result<()> {
        // small enough to keep the prior plus graph term positive definite
        let model = Sdml::params()
            .balance_param(0.01)
            .use_cov(false)
            .fit(&DatasetBase::new(records(), graph()))?;

        assert!(model.converged());
        let metric = model.metric();
        assert!(metric[(1, 1)] < metric[(0, 0)]);
        Ok(())
    }

    #[test]
    fn diagonal_graph_term_is_ignored() -> Result<()> {
        let mut with_loops = graph();
        for i in 0..6 {
            with_loops[(i, i)] = 3.;
        }

        let params = Sdml::params().balance_param(0.1).use_cov(false);
        let plain = params.fit(&DatasetBase::new(records(), graph()))?;
        let looped = params.fit(&DatasetBase::new(records(), with_loops))?;

        assert_abs_diff_eq!(plain.metric(), looped.metric(), epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn indefinite_matrix_is_clipped() -> Result<()> {
        // a large balance lets the dissimilar pairs dominate the prior
        let model = Sdml::params()
            .balance_param(10.)
            .use_cov(false)
            .fit(&DatasetBase::new(records(), graph()))?;

        let (vals, _) = eigh_sorted(&model.metric())?;
        assert!(vals.iter().all(|v| *v > 0.));
        Ok(())
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            Sdml::params()
                .balance_param(-1.)
                .fit(&DatasetBase::new(records(), graph())),
            Err(WeaklySupervisedError::InvalidBalance(_))
        ));
        assert!(matches!(
            Sdml::params()
                .sparsity_param(-1.)
                .fit(&DatasetBase::new(records(), graph())),
            Err(WeaklySupervisedError::InvalidSparsity(_))
        ));

        assert!(matches!(
            Sdml::params().fit(&DatasetBase::new(records(), Array2::<f64>::zeros((5, 5)))),
            Err(WeaklySupervisedError::BaseCrate(Error::InputShape(_)))
        ));
        assert!(matches!(
            Sdml::params().fit(&DatasetBase::new(records(), Array2::<f64>::zeros((6, 6)))),
            Err(WeaklySupervisedError::NoConstraints(_))
        ));

        // dissimilar pairs overwhelm the identity prior in every direction
        let spread = records() * 10.;
        assert!(matches!(
            Sdml::params()
                .balance_param(10.)
                .use_cov(false)
                .fit(&DatasetBase::new(spread, -graph().mapv(f64::abs))),
            Err(WeaklySupervisedError::BaseCrate(Error::SingularMatrix(_)))
        ));
    }

    #[test]
    fn collinear_records_use_pseudo_inverse() -> Result<()> {
        let collinear = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.], [4., 4.], [5., 5.]];
        let model = Sdml::params().fit(&DatasetBase::new(collinear, graph()))?;

        let metric = model.metric();
        assert!(metric.iter().all(|v| v.is_finite()));
        let (vals, _) = eigh_sorted(&metric)?;
        assert!(vals.iter().all(|v| *v > 0.));
        Ok(())
    }
}
