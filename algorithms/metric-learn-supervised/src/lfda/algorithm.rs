use std::cmp::Ordering;

use metric_learn::dataset::{AsTargets, DatasetBase, Label};
use metric_learn::graph::SimilarityGraph;
use metric_learn::linalg::{generalized_eigh, orthonormalize_columns, outer, symmetrize};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{LfdaEmbedding, LfdaValidParams, LocalScale};
use crate::error::{Result, SupervisedError};
use crate::utils::{check_components, select_rows, sq_distances, Classes};

/// Fitted Local Fisher Discriminant Analysis metric
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn_supervised::{Lfda, LocalScale};
///
/// let iris = metric_learn_datasets::iris();
/// let model = Lfda::params().n_components(2).fit(&iris).unwrap();
/// let embedded = model.transform(iris.records());
///
/// // bandwidth from the second nearest neighbour instead of the class spread
/// let kth = Lfda::params()
///     .n_components(2)
///     .k(2)
///     .local_scale(LocalScale::KthNeighbor)
///     .fit(&iris)
///     .unwrap();
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Lfda<F> {
    transformer: Array2<F>,
    eigenvalues: Array1<F>,
}

impl<F: Float> Lfda<F> {
    /// Generalized eigenvalues of the kept components, in descending order
    pub fn eigenvalues(&self) -> &Array1<F> {
        &self.eigenvalues
    }
}

impl<F: Float> MahalanobisMetric<F> for Lfda<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, SupervisedError> for LfdaValidParams<F>
where
    F: Float,
    L: Label,
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = Lfda<F>;

    /// Fit the local Fisher discriminant
    ///
    /// A singular local within-class scatter, for example from a feature constant inside every
    /// class, is regularized. Fails with `SingularMatrix` if the scatter vanishes entirely.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let classes = Classes::from_dataset(&x, dataset.targets().as_targets())?;
        let n_components = check_components(self.n_components(), x.ncols())?;

        let (between, within) = local_scatter(x, &classes, self.k(), self.local_scale());
        let (vals, vecs) = generalized_eigh(&between, &within, "local within-class scatter")?;

        // the solver returns ascending eigenvalues
        let order = (0..vals.len()).rev().take(n_components).collect::<Vec<_>>();
        let eigenvalues = vals.select(Axis(0), &order);
        let mut basis = vecs.select(Axis(1), &order);

        match self.embedding() {
            LfdaEmbedding::Weighted => {
                for (mut col, val) in basis.axis_iter_mut(Axis(1)).zip(eigenvalues.iter()) {
                    col *= val.max(F::zero()).sqrt();
                }
            }
            LfdaEmbedding::Orthonormalized => basis = orthonormalize_columns(&basis),
            LfdaEmbedding::Plain => {}
        }

        if self.verbose() {
            log::info!("lfda eigenvalues {}", eigenvalues);
        }

        Ok(Lfda {
            transformer: basis.reversed_axes(),
            eigenvalues,
        })
    }
}

/// Local between-class and within-class scatter matrices
fn local_scatter<F: Float>(
    x: ArrayView2<F>,
    classes: &Classes,
    k: usize,
    scale: LocalScale,
) -> (Array2<F>, Array2<F>) {
    let d = x.ncols();
    let n = F::cast(x.nrows());
    let mut between = Array2::zeros((d, d));
    let mut within = Array2::zeros((d, d));

    for members in &classes.members {
        let xc = select_rows(&x, members);
        let nc = F::cast(members.len());

        let affinity = local_affinity(xc.view(), k, scale);
        let local = affinity.laplacian_form(&xc.view());
        let sum = xc.sum_axis(Axis(0));

        between += &(&local / n);
        between += &(xc.t().dot(&xc) * (F::one() - nc / n));
        between += &(outer(sum.view(), sum.view()) / n);
        within += &(&local / nc);
    }

    let total = x.sum_axis(Axis(0));
    between -= &(outer(total.view(), total.view()) / n);
    between -= &within;

    (symmetrize(&between), symmetrize(&within))
}

/// Affinity `A_ij = exp(−‖x_i − x_j‖² / (σ_i σ_j))` between the members of a class
fn local_affinity<F: Float>(xc: ArrayView2<F>, k: usize, scale: LocalScale) -> Array2<F> {
    let dist = sq_distances(&xc);
    let sigma = dist.map_axis(Axis(1), |row| local_sigma(row, k, scale));

    Array2::from_shape_fn(dist.dim(), |(i, j)| {
        let bandwidth = sigma[i] * sigma[j];
        if bandwidth > F::zero() {
            (-dist[(i, j)] / bandwidth).exp()
        } else {
            F::zero()
        }
    })
}

/// Local scale of a record from its squared distances to the class, itself included
fn local_sigma<F: Float>(row: ArrayView1<F>, k: usize, scale: LocalScale) -> F {
    let nc = row.len();
    match scale {
        LocalScale::KthNeighbor => {
            let mut sorted = row.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            // position zero holds the record itself
            sorted[k.min(nc - 1)].sqrt()
        }
        LocalScale::ClassSpread if nc > 1 => (row.sum() / F::cast(nc - 1)).sqrt(),
        LocalScale::ClassSpread => F::zero(),
    }
}
