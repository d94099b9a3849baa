use metric_learn::constraints::Quadruplets;
use metric_learn::dataset::DatasetBase;
use metric_learn::linalg::{covariance, factor_metric, inv_spd, log_det, regularize};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{LsmlPrior, LsmlValidParams};
use crate::error::{Result, WeaklySupervisedError};

/// Smallest step, relative to the gradient norm, tried by the line search
const MIN_STEP: f64 = 1e-10;

/// Fitted Least Squared-residual Metric Learning model
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn::sampling;
/// use metric_learn_weakly::Lsml;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let iris = metric_learn_datasets::iris();
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
/// let quadruplets = sampling::quadruplets(iris.targets().view(), 200, &mut rng).unwrap();
///
/// let dataset = DatasetBase::new(iris.records().clone(), quadruplets);
/// let model = Lsml::params().fit(&dataset).unwrap();
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Lsml<F> {
    transformer: Array2<F>,
    loss: F,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> Lsml<F> {
    /// Loss of the learned metric
    pub fn loss(&self) -> F {
        self.loss
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the descent stopped before exhausting the iterations
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float> MahalanobisMetric<F> for Lsml<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

/// Difference vectors of the compared pairs
struct Comparisons<F> {
    ab: Array2<F>,
    cd: Array2<F>,
    weight: F,
}

impl<F: Float> Comparisons<F> {
    fn new(x: ArrayView2<F>, quadruplets: &Quadruplets) -> Self {
        let idx = quadruplets.indices();
        let ab = &x.select(Axis(0), &idx.column(0).to_vec())
            - &x.select(Axis(0), &idx.column(1).to_vec());
        let cd = &x.select(Axis(0), &idx.column(2).to_vec())
            - &x.select(Axis(0), &idx.column(3).to_vec());

        Comparisons {
            ab,
            cd,
            weight: F::one() / F::cast(quadruplets.len()),
        }
    }

    /// Squared distances `vᵀMv` of both sides of every comparison
    fn distances(&self, m: &Array2<F>) -> (Array1<F>, Array1<F>) {
        let quad_form = |v: &Array2<F>| (v.dot(m) * v).sum_axis(Axis(1));
        (quad_form(&self.ab), quad_form(&self.cd))
    }
}

struct Objective<F> {
    comparisons: Comparisons<F>,
    prior_inv: Array2<F>,
}

impl<F: Float> Objective<F> {
    /// Loss at `m`, `None` if `m` is not positive definite
    fn loss(&self, m: &Array2<F>) -> Option<F> {
        let log_det = log_det(m)?;
        let (d_ab, d_cd) = self.comparisons.distances(m);

        let residual = d_ab
            .iter()
            .zip(d_cd.iter())
            .filter(|(ab, cd)| ab > cd)
            .map(|(ab, cd)| {
                let diff = ab.sqrt() - cd.sqrt();
                diff * diff
            })
            .sum::<F>()
            * self.comparisons.weight;

        Some(residual + (m * &self.prior_inv).sum() - log_det)
    }

    fn gradient(&self, m: &Array2<F>) -> Result<Array2<F>> {
        let mut gradient = &self.prior_inv - &inv_spd(m, "metric")?;
        let (d_ab, d_cd) = self.comparisons.distances(m);
        let weight = self.comparisons.weight;

        for (idx, (ab, cd)) in d_ab.iter().zip(d_cd.iter()).enumerate() {
            if ab <= cd {
                continue;
            }

            let v_ab = self.comparisons.ab.row(idx).insert_axis(Axis(1));
            gradient.scaled_add(
                weight * (F::one() - (*cd / *ab).sqrt()),
                &v_ab.dot(&v_ab.t()),
            );
            // a zero distance on the far side only pulls on `ab`
            if *cd > F::zero() {
                let v_cd = self.comparisons.cd.row(idx).insert_axis(Axis(1));
                gradient.scaled_add(
                    weight * (F::one() - (*ab / *cd).sqrt()),
                    &v_cd.dot(&v_cd.t()),
                );
            }
        }

        Ok(gradient)
    }
}

fn frobenius<F: Float>(a: &Array2<F>) -> F {
    a.iter().map(|v| *v * *v).sum::<F>().sqrt()
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, Quadruplets, WeaklySupervisedError>
    for LsmlValidParams<F>
{
    type Object = Lsml<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, Quadruplets>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let quadruplets = dataset.targets();
        if quadruplets.is_empty() {
            return Err(WeaklySupervisedError::NoConstraints(
                "no quadruplets given".into(),
            ));
        }
        quadruplets.check_records(x.nrows())?;

        let prior = match self.prior() {
            LsmlPrior::Covariance => regularize(&covariance(&x, 1)?, "prior covariance")?,
            LsmlPrior::Identity => Array2::eye(x.ncols()),
        };
        let objective = Objective {
            comparisons: Comparisons::new(x, quadruplets),
            prior_inv: inv_spd(&prior, "prior covariance")?,
        };

        let metric = prior;
        let loss = objective.loss(&metric).ok_or_else(|| {
            metric_learn::Error::NumericalInstability("prior is not positive definite".into())
        })?;
        let (metric, loss, n_iter, converged) = self.descend(&objective, metric, loss)?;

        Ok(Lsml {
            transformer: factor_metric(&metric)?,
            loss,
            n_iter,
            converged,
        })
    }
}

impl<F: Float> LsmlValidParams<F> {
    /// Gradient descent with a backtracking line search which only accepts positive definite
    /// candidates lowering the loss
    fn descend(
        &self,
        objective: &Objective<F>,
        mut metric: Array2<F>,
        mut loss: F,
    ) -> Result<(Array2<F>, F, usize, bool)> {
        let mut n_iter = 0;
        let mut converged = false;
        let mut accepted = 0;
        let mut seen_definite = false;

        for iteration in 0..self.max_iter() {
            n_iter = iteration + 1;
            let gradient = objective.gradient(&metric)?;
            let norm = frobenius(&gradient);
            if norm < self.tol() {
                converged = true;
                break;
            }

            let mut step = norm.recip();
            let mut found = None;
            while step * norm >= F::cast(MIN_STEP) {
                let candidate = &metric - &(&gradient * step);
                if let Some(candidate_loss) = objective.loss(&candidate) {
                    seen_definite = true;
                    if candidate_loss < loss {
                        found = Some((candidate, candidate_loss));
                        break;
                    }
                }
                step = step * F::cast(0.5);
            }

            let (candidate, candidate_loss) = match found {
                Some(found) => found,
                None => {
                    if accepted == 0 && !seen_definite {
                        return Err(metric_learn::Error::NumericalInstability(
                            "line search found no positive definite metric".into(),
                        )
                        .into());
                    }
                    converged = true;
                    break;
                }
            };

            let decrease = loss - candidate_loss;
            metric = candidate;
            loss = candidate_loss;
            accepted += 1;

            if self.verbose() {
                log::info!("lsml iteration {}: loss {}, step {}", n_iter, loss, step);
            }

            if decrease < self.tol() {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "lsml did not converge within {} iterations, loss {}",
                self.max_iter(),
                loss
            );
        }

        Ok((metric, loss, n_iter, converged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use approx::assert_abs_diff_eq;
    use metric_learn::prelude::*;
    use metric_learn::linalg::is_positive_definite;
    use ndarray::array;

    fn records() -> Array2<f64> {
        array![
            [0., 0.],
            [0.2, 2.],
            [0.1, -1.5],
            [4., 0.1],
            [4.2, 1.8],
            [3.9, -2.],
        ]
    }

    fn objective(x: &Array2<f64>, quadruplets: &Quadruplets) -> Objective<f64> {
        Objective {
            comparisons: Comparisons::new(x.view(), quadruplets),
            prior_inv: inv_spd(&covariance(x, 1).unwrap(), "prior").unwrap(),
        }
    }

    #[test]
    fn satisfied_comparisons_keep_identity() {
        let x = array![[0., 0.], [1., 0.], [5., 0.], [0., 5.]];
        let quadruplets = Quadruplets::new(array![[0, 1, 2, 3]]).unwrap();
        let dataset = DatasetBase::new(x, quadruplets);

        let model = Lsml::params()
            .prior(LsmlPrior::Identity)
            .fit(&dataset)
            .unwrap();

        assert!(model.converged());
        assert_eq!(model.n_iter(), 1);
        assert_abs_diff_eq!(model.metric(), Array2::eye(2), epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let x = records();
        let quadruplets = Quadruplets::new(array![[0, 1, 0, 3], [3, 5, 2, 4], [1, 2, 1, 4]]).unwrap();
        let objective = objective(&x, &quadruplets);

        let m = array![[1.5, 0.3], [0.3, 0.8]];
        let gradient = objective.gradient(&m).unwrap();

        let h = 1e-6;
        for (i, j) in [(0, 0), (0, 1), (1, 1)].iter().copied() {
            let mut direction = Array2::zeros((2, 2));
            direction[(i, j)] = 1.;
            direction[(j, i)] = 1.;

            let numeric = (objective.loss(&(&m + &(&direction * h))).unwrap()
                - objective.loss(&(&m - &(&direction * h))).unwrap())
                / (2. * h);
            let analytic = (&gradient * &direction).sum();
            assert_abs_diff_eq!(numeric, analytic, epsilon = 1e-5);
        }
    }

    #[test]
    fn loss_only_decreases() -> Result<()> {
        let x = records();
        // same-class pairs vary along the second feature, other-class pairs along the first
        let quadruplets =
            Quadruplets::new(array![[1, 2, 0, 3], [4, 5, 1, 4], [0, 1, 2, 5], [3, 4, 0, 4]])?;
        let initial = objective(&x, &quadruplets)
            .loss(&covariance(&x, 1)?)
            .unwrap();

        let model = Lsml::params().fit(&DatasetBase::new(x, quadruplets))?;
        assert!(model.loss() <= initial);
        assert!(is_positive_definite(&model.metric()));
        assert_eq!(model.transformer().dim(), (2, 2));

        Ok(())
    }

    #[test]
    fn invalid_inputs() {
        let x = records();

        let empty = Quadruplets::new(Array2::zeros((0, 4))).unwrap();
        assert!(matches!(
            Lsml::params().fit(&DatasetBase::new(x.clone(), empty)),
            Err(WeaklySupervisedError::NoConstraints(_))
        ));

        let out_of_range = Quadruplets::new(array![[0, 1, 2, 6]]).unwrap();
        assert!(matches!(
            Lsml::params().fit(&DatasetBase::new(x.clone(), out_of_range)),
            Err(WeaklySupervisedError::BaseCrate(Error::InputShape(_)))
        ));

        let quadruplets = Quadruplets::new(array![[0, 1, 2, 3]]).unwrap();
        assert!(matches!(
            Lsml::params()
                .tol(-1.)
                .fit(&DatasetBase::new(x.clone(), quadruplets.clone())),
            Err(WeaklySupervisedError::InvalidTolerance(_))
        ));

        // identical records leave nothing to regularize
        let constant = Array2::<f64>::ones((4, 2));
        assert!(matches!(
            Lsml::params().fit(&DatasetBase::new(constant, quadruplets)),
            Err(WeaklySupervisedError::BaseCrate(Error::SingularMatrix(_)))
        ));
    }

    #[test]
    fn duplicated_feature_regularizes_prior() -> Result<()> {
        let collinear = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.]];
        // both pairs are equally far apart, so the regularized prior is already optimal
        let quadruplets = Quadruplets::new(array![[0, 1, 2, 3]]).unwrap();
        let model = Lsml::params().fit(&DatasetBase::new(collinear.clone(), quadruplets))?;

        assert!(model.converged());
        assert_eq!(model.n_iter(), 1);
        let cov = covariance(&collinear, 1)?;
        assert_abs_diff_eq!(model.metric(), cov, epsilon = 1e-4);
        Ok(())
    }
}
