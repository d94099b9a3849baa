use metric_learn::dataset::{AsTargets, DatasetBase, Label};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{NcaUpdate, NcaValidParams};
use crate::error::{Result, SupervisedError};
use crate::utils::{check_components, sq_dist, Classes};

/// Fitted Neighbourhood Components Analysis metric
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn_supervised::Nca;
///
/// let iris = metric_learn_datasets::iris();
/// let model = Nca::params().max_iter(100000 / 150).fit(&iris).unwrap();
///
/// assert_eq!(model.transformer().dim(), (4, 4));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Nca<F> {
    transformer: Array2<F>,
    objective: F,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> Nca<F> {
    /// Expected number of correctly classified points during the last pass
    pub fn objective(&self) -> F {
        self.objective
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the gradient norm fell below the tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float> MahalanobisMetric<F> for Nca<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, SupervisedError> for NcaValidParams<F>
where
    F: Float,
    L: Label,
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = Nca<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let classes = Classes::from_dataset(&x, dataset.targets().as_targets())?;
        let n_components = check_components(self.n_components(), x.ncols())?;

        let mut transformer = initial_transformer(&x, n_components);
        let mut objective = F::zero();
        let mut n_iter = 0;
        let mut converged = false;

        for iteration in 0..self.max_iter() {
            let (correct, gradient_norm) = match self.update() {
                NcaUpdate::Sweep => self.sweep(x, &classes, &mut transformer),
                NcaUpdate::Batch => self.batch(x, &classes, &mut transformer),
            };
            objective = correct;
            n_iter = iteration + 1;

            if self.verbose() {
                log::info!(
                    "nca pass {}: expected correct {}, gradient norm {}",
                    n_iter,
                    objective,
                    gradient_norm
                );
            }

            if gradient_norm < self.tol() {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "nca did not converge within {} passes, objective {}",
                self.max_iter(),
                objective
            );
        }

        Ok(Nca {
            transformer,
            objective,
            n_iter,
            converged,
        })
    }
}

impl<F: Float> NcaValidParams<F> {
    /// Apply the contribution of every point right after computing it
    fn sweep(&self, x: ArrayView2<F>, classes: &Classes, transformer: &mut Array2<F>) -> (F, F) {
        let mut correct = F::zero();
        let mut total = Array2::zeros(transformer.dim());

        for i in 0..x.nrows() {
            let proj = x.dot(&transformer.t());
            let (p_correct, scatter) = contribution(x, proj.view(), classes, i);
            let gradient = transformer.dot(&scatter);

            transformer.scaled_add(self.learning_rate(), &gradient);
            total += &gradient;
            correct += p_correct;
        }

        (correct, frobenius(&total))
    }

    /// Accumulate the contributions of a pass under a fixed transformer
    fn batch(&self, x: ArrayView2<F>, classes: &Classes, transformer: &mut Array2<F>) -> (F, F) {
        let proj = x.dot(&transformer.t());
        let mut correct = F::zero();
        let mut scatter = Array2::zeros((x.ncols(), x.ncols()));

        for i in 0..x.nrows() {
            let (p_correct, contrib) = contribution(x, proj.view(), classes, i);
            scatter += &contrib;
            correct += p_correct;
        }

        let gradient = transformer.dot(&scatter);
        transformer.scaled_add(self.learning_rate(), &gradient);

        (correct, frobenius(&gradient))
    }
}

/// Scale every feature to unit range, constant features are kept as they are
fn initial_transformer<F: Float>(x: &ArrayView2<F>, n_components: usize) -> Array2<F> {
    let scales = x.map_axis(Axis(0), |col| {
        let (min, max) = col
            .iter()
            .fold((F::infinity(), F::neg_infinity()), |(min, max), v| {
                (min.min(*v), max.max(*v))
            });
        if max > min {
            (max - min).recip()
        } else {
            F::one()
        }
    });

    Array2::from_diag(&scales)
        .slice(s![..n_components, ..])
        .to_owned()
}

/// Probability of point `i` to pick a neighbour of its own class and the gradient direction
/// `Σ_j (p_i p_ij − [c_i = c_j] p_ij)(x_i − x_j)(x_i − x_j)ᵀ` of that probability
fn contribution<F: Float>(
    x: ArrayView2<F>,
    proj: ArrayView2<F>,
    classes: &Classes,
    i: usize,
) -> (F, Array2<F>) {
    let dist = (0..proj.nrows())
        .map(|j| {
            if j == i {
                F::infinity()
            } else {
                sq_dist(proj.row(i), proj.row(j))
            }
        })
        .collect::<Array1<F>>();

    // shift by the smallest distance, the softmax does not change
    let closest = dist.fold(F::infinity(), |acc, d| acc.min(*d));
    let mut softmax = dist.mapv(|d| {
        if d.is_finite() {
            (closest - d).exp()
        } else {
            F::zero()
        }
    });
    let norm = softmax.sum();
    if norm > F::zero() {
        softmax /= norm;
    }

    let p_correct = softmax
        .iter()
        .enumerate()
        .filter(|(j, _)| classes.same(i, *j))
        .map(|(_, p)| *p)
        .sum::<F>();

    let weights = softmax
        .iter()
        .enumerate()
        .map(|(j, p)| {
            if classes.same(i, j) {
                p_correct * *p - *p
            } else {
                p_correct * *p
            }
        })
        .collect::<Array1<F>>();

    let diffs = &x - &x.row(i);
    let weighted = &diffs * &weights.insert_axis(Axis(1));

    (p_correct, diffs.t().dot(&weighted))
}

fn frobenius<F: Float>(a: &Array2<F>) -> F {
    a.iter().map(|v| *v * *v).sum::<F>().sqrt()
}
