use metric_learn::constraints::Pairs;
use metric_learn::dataset::DatasetBase;
use metric_learn::linalg::factor_metric;
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::ItmlValidParams;
use crate::error::{Result, WeaklySupervisedError};

/// Pairs closer than this in the input space carry no information
const MIN_PAIR_NORM: f64 = 1e-9;

/// Fitted Information Theoretic Metric Learning model
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn_weakly::Itml;
/// use ndarray::array;
///
/// let records = array![[0., 0.], [0.1, 3.], [5., 0.5], [5.1, -2.5]];
/// let pairs = Pairs::new(array![[0, 1], [2, 3]], array![[0, 2], [1, 3]]).unwrap();
///
/// let model = Itml::params()
///     .bounds(1.0, 4.0)
///     .fit(&DatasetBase::new(records, pairs))
///     .unwrap();
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Itml<F> {
    transformer: Array2<F>,
    bounds: (F, F),
    n_iter: usize,
    converged: bool,
}

impl<F: Float> Itml<F> {
    /// The distance bounds used for similar and dissimilar pairs
    pub fn bounds(&self) -> (F, F) {
        self.bounds
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float> MahalanobisMetric<F> for Itml<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

/// Percentile with linear interpolation between the closest ranks
fn percentile<F: Float>(sorted: &[F], p: F) -> F {
    let rank = F::cast(sorted.len() - 1) * p / F::cast(100.);
    let lower = rank.floor();
    let pos = lower.to_usize().unwrap_or(0);
    let upper = (pos + 1).min(sorted.len() - 1);

    sorted[pos] + (sorted[upper] - sorted[pos]) * (rank - lower)
}

/// The 5th and 95th percentile of the distances between all pairs of distinct records
///
/// Each unordered pair counts once and the zero distance of a record to itself is left
/// out. With it, the 5th percentile would be zero for up to 19 records.
pub fn default_bounds<F: Float>(x: ArrayView2<F>) -> Result<(F, F)> {
    let n = x.nrows();
    if n < 2 {
        return Err(metric_learn::Error::NotEnoughSamples(
            "distance bounds need at least two records".into(),
        )
        .into());
    }

    let mut distances = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let diff = &x.row(i) - &x.row(j);
            distances.push(diff.dot(&diff).sqrt());
        }
    }
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok((
        percentile(&distances, F::cast(5.)),
        percentile(&distances, F::cast(95.)),
    ))
}

/// Difference vectors of the pairs which are not degenerate
fn pair_differences<F: Float>(x: ArrayView2<F>, pairs: ArrayView2<usize>) -> Vec<Array1<F>> {
    pairs
        .axis_iter(Axis(0))
        .map(|pair: ArrayView1<usize>| &x.row(pair[0]) - &x.row(pair[1]))
        .filter(|diff| diff.dot(diff).sqrt() > F::cast(MIN_PAIR_NORM))
        .collect()
}

fn norm<F: Float>(v: &Array1<F>) -> F {
    v.dot(v).sqrt()
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, Pairs, WeaklySupervisedError>
    for ItmlValidParams<F>
{
    type Object = Itml<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, Pairs>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let pairs = dataset.targets();
        pairs.check_records(x.nrows())?;

        let similar = pair_differences(x, pairs.similar());
        let dissimilar = pair_differences(x, pairs.dissimilar());
        if similar.len() + dissimilar.len() == 0 {
            return Err(WeaklySupervisedError::NoConstraints(
                "all pairs are empty or join identical records".into(),
            ));
        }

        let bounds = match self.bounds() {
            Some(bounds) => bounds,
            None => match default_bounds(x)? {
                (similar, dissimilar) if similar > F::zero() && dissimilar > F::zero() => {
                    (similar, dissimilar)
                }
                (similar, dissimilar) => {
                    return Err(WeaklySupervisedError::InvalidBounds {
                        similar: similar.to_f32().unwrap_or(f32::NAN),
                        dissimilar: dissimilar.to_f32().unwrap_or(f32::NAN),
                    })
                }
            },
        };
        if self.verbose() {
            log::info!(
                "itml bounds: similar {}, dissimilar {}",
                bounds.0,
                bounds.1
            );
        }

        let (metric, n_iter, converged) = self.project(x.ncols(), &similar, &dissimilar, bounds)?;

        Ok(Itml {
            transformer: factor_metric(&metric)?,
            bounds,
            n_iter,
            converged,
        })
    }
}

impl<F: Float> ItmlValidParams<F> {
    /// Cyclic Bregman projections, first onto the similar then onto the dissimilar pairs
    fn project(
        &self,
        n_features: usize,
        similar: &[Array1<F>],
        dissimilar: &[Array1<F>],
        (upper, lower): (F, F),
    ) -> Result<(Array2<F>, usize, bool)> {
        let gamma = self.gamma();
        let gamma_proj = gamma / (gamma + F::one());
        let n_similar = similar.len();

        let mut metric = Array2::<F>::eye(n_features);
        let mut lambda = Array1::<F>::zeros(n_similar + dissimilar.len());
        let mut lambda_old = lambda.clone();
        let mut slack = Array1::from_shape_fn(lambda.len(), |idx| {
            if idx < n_similar {
                upper
            } else {
                lower
            }
        });

        let mut n_iter = 0;
        let mut converged = false;

        for iteration in 0..self.max_iter() {
            n_iter = iteration + 1;

            for (idx, v) in similar.iter().chain(dissimilar.iter()).enumerate() {
                let mv = metric.dot(v);
                let wtw = v.dot(&mv);
                let bound = slack[idx];

                // similar pairs are pulled below `bound`, dissimilar pairs pushed above it
                let (alpha, beta) = if idx < n_similar {
                    let alpha = lambda[idx].min(gamma_proj * (wtw.recip() - bound.recip()));
                    let denom = F::one() - alpha * wtw;
                    check_denominator(denom)?;
                    slack[idx] = (bound.recip() + alpha / gamma).recip();
                    (alpha, alpha / denom)
                } else {
                    let alpha = lambda[idx].min(gamma_proj * (bound.recip() - wtw.recip()));
                    let denom = F::one() + alpha * wtw;
                    check_denominator(denom)?;
                    slack[idx] = (bound.recip() - alpha / gamma).recip();
                    (alpha, -alpha / denom)
                };
                lambda[idx] -= alpha;

                let col = mv.view().insert_axis(Axis(1));
                metric.scaled_add(beta, &col.dot(&col.t()));
            }

            let norm_sum = norm(&lambda) + norm(&lambda_old);
            if norm_sum == F::zero() {
                converged = true;
                break;
            }
            let change = (&lambda - &lambda_old).mapv(|v| v.abs()).sum() / norm_sum;

            if self.verbose() {
                log::info!("itml sweep {}: change {}", n_iter, change);
            }

            if change < self.convergence_threshold() {
                converged = true;
                break;
            }
            lambda_old.assign(&lambda);
        }

        if !converged {
            log::warn!("itml did not converge within {} sweeps", self.max_iter());
        }

        Ok((metric, n_iter, converged))
    }
}

fn check_denominator<F: Float>(denom: F) -> Result<()> {
    if denom <= F::epsilon() {
        return Err(metric_learn::Error::SingularMatrix(
            "bregman projection would make the metric singular".into(),
        )
        .into());
    }

    Ok(())
}
