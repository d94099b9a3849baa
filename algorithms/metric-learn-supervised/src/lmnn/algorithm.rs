use std::cmp::Ordering;

use metric_learn::dataset::{AsTargets, DatasetBase, Label};
use metric_learn::graph::SimilarityGraph;
use metric_learn::linalg::{clip_eigenvalues, factor_metric};
use metric_learn::metric::MahalanobisMetric;
use metric_learn::traits::Fit;
use metric_learn::Float;
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{LmnnImpl, LmnnValidParams};
use crate::error::{Result, SupervisedError};
use crate::utils::{sq_dist, sq_distances, Classes};

/// Fitted Large Margin Nearest Neighbor metric
///
/// The model keeps the transformer `L` together with the diagnostics of the run.
///
/// # Example
///
/// ```no_run
/// use metric_learn::prelude::*;
/// use metric_learn_supervised::Lmnn;
///
/// let iris = metric_learn_datasets::iris();
/// let model = Lmnn::params().k(5).learning_rate(1e-6).fit(&iris).unwrap();
///
/// let separation = class_separation(&model.transform(iris.records()), iris.targets().view());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Lmnn<F> {
    transformer: Array2<F>,
    objective: F,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> Lmnn<F> {
    /// Objective value of the accepted solution
    pub fn objective(&self) -> F {
        self.objective
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the objective decrease fell below the tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float> MahalanobisMetric<F> for Lmnn<F> {
    fn transformer(&self) -> ArrayView2<'_, F> {
        self.transformer.view()
    }
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, SupervisedError> for LmnnValidParams<F>
where
    F: Float,
    L: Label,
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = Lmnn<F>;

    /// Learn a large margin metric from labeled records
    ///
    /// Fails if a class has at most `k` members, the target neighbours could not be chosen
    /// inside the class otherwise.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let classes = Classes::from_dataset(&x, dataset.targets().as_targets())?;
        let problem = Problem::new(x, &classes, self.k(), self.regularization())?;

        match self.implementation() {
            LmnnImpl::Reference => self.fit_reference(&problem),
            LmnnImpl::Accelerated => self.fit_accelerated(&problem),
        }
    }
}

impl<F: Float> LmnnValidParams<F> {
    fn fit_reference(&self, problem: &Problem<F>) -> Result<Lmnn<F>> {
        let x = problem.x;
        let impostors = problem.all_impostors();

        let descent = self.descend(
            Array2::eye(x.ncols()),
            None,
            |m, _| {
                let proj = x.dot(&factor_metric(m)?.t());
                Ok(problem.evaluate(proj.view(), &impostors))
            },
            |m, gradient, lr| Ok(clip_eigenvalues(&(m - &(gradient * lr)), F::zero())?),
        )?;
        if self.verbose() {
            log::info!("lmnn: final learning rate {}", descent.learning_rate);
        }

        Ok(Lmnn {
            transformer: factor_metric(&descent.state)?,
            objective: descent.objective,
            n_iter: descent.n_iter,
            converged: descent.converged,
        })
    }

    fn fit_accelerated(&self, problem: &Problem<F>) -> Result<Lmnn<F>> {
        let x = problem.x;
        let mut candidates = Vec::new();

        let descent = self.descend(
            Array2::eye(x.ncols()),
            Some(self.impostor_refresh()),
            |l, refresh| {
                let proj = x.dot(&l.t());
                if refresh {
                    candidates = problem.impostor_candidates(proj.view());
                }
                Ok(problem.evaluate(proj.view(), &candidates))
            },
            // the gradient of the objective in `L` is `2 L G`
            |l, gradient, lr| Ok(l - &(l.dot(gradient) * (lr + lr))),
        )?;
        if self.verbose() {
            log::info!("lmnn: final learning rate {}", descent.learning_rate);
        }

        Ok(Lmnn {
            transformer: descent.state,
            objective: descent.objective,
            n_iter: descent.n_iter,
            converged: descent.converged,
        })
    }

    /// Adaptive gradient descent shared by both parametrisations
    ///
    /// A step which increases the objective is retried from the last accepted state with half
    /// the learning rate, an accepted step grows the learning rate by one percent.
    ///
    /// `evaluate` receives `true` when it should rebuild its impostor set from the given
    /// state. With `refresh_every` set this happens for the accepted state every that many
    /// iterations, which is then scored again so that the candidate step is compared against
    /// the same impostors.
    fn descend<E, U>(
        &self,
        init: Array2<F>,
        refresh_every: Option<usize>,
        mut evaluate: E,
        mut update: U,
    ) -> Result<Descent<F>>
    where
        E: FnMut(&Array2<F>, bool) -> Result<Evaluation<F>>,
        U: FnMut(&Array2<F>, &Array2<F>, F) -> Result<Array2<F>>,
    {
        let first = evaluate(&init, true)?;
        let (mut objective, mut gradient) = (first.objective, first.gradient);
        let mut learning_rate = self.learning_rate();

        let mut accepted = init;
        let mut state = update(&accepted, &gradient, learning_rate)?;
        let mut n_iter = 0;
        let mut converged = false;

        for iteration in 1..self.max_iter() {
            n_iter = iteration;
            if refresh_every.map_or(false, |every| iteration % every == 0) {
                let rescored = evaluate(&accepted, true)?;
                objective = rescored.objective;
                gradient = rescored.gradient;
                state = update(&accepted, &gradient, learning_rate)?;
            }
            let eval = evaluate(&state, false)?;

            if eval.objective > objective {
                learning_rate /= F::cast(2.);
                state = update(&accepted, &gradient, learning_rate)?;
                continue;
            }

            let delta = objective - eval.objective;
            accepted = state;
            objective = eval.objective;
            gradient = eval.gradient;
            learning_rate *= F::cast(1.01);

            if self.verbose() {
                log::info!(
                    "lmnn iteration {}: objective {}, {} active constraints, learning rate {}",
                    iteration,
                    objective,
                    eval.n_active,
                    learning_rate
                );
            }

            if iteration > self.min_iter() && delta < self.tol() {
                converged = true;
                break;
            }

            state = update(&accepted, &gradient, learning_rate)?;
        }

        if !converged {
            log::warn!(
                "lmnn did not converge within {} iterations, objective {}",
                self.max_iter(),
                objective
            );
        }

        Ok(Descent {
            state: accepted,
            objective,
            learning_rate,
            n_iter,
            converged,
        })
    }
}

struct Descent<F> {
    state: Array2<F>,
    objective: F,
    learning_rate: F,
    n_iter: usize,
    converged: bool,
}

struct Evaluation<F> {
    objective: F,
    gradient: Array2<F>,
    n_active: usize,
}

/// Everything which stays fixed during the optimisation
struct Problem<'a, F> {
    x: ArrayView2<'a, F>,
    classes: &'a Classes,
    targets: Vec<Vec<usize>>,
    pull: Array2<F>,
    regularization: F,
}

impl<'a, F: Float> Problem<'a, F> {
    fn new(
        x: ArrayView2<'a, F>,
        classes: &'a Classes,
        k: usize,
        regularization: F,
    ) -> Result<Self> {
        let targets = target_neighbours(&x, classes, k)?;

        let mut weights = Array2::zeros((x.nrows(), x.nrows()));
        for (i, neighbours) in targets.iter().enumerate() {
            for &j in neighbours {
                weights[(i, j)] += F::one();
            }
        }
        let pull = scatter(x, &weights);

        Ok(Problem {
            x,
            classes,
            targets,
            pull,
            regularization,
        })
    }

    /// Every pair of records from different classes
    fn all_impostors(&self) -> Vec<(usize, usize)> {
        let n = self.x.nrows();
        (0..n)
            .flat_map(|i| (0..n).map(move |l| (i, l)))
            .filter(|&(i, l)| !self.classes.same(i, l))
            .collect()
    }

    /// Pairs `(i, l)` where `l` is inside the margin of the furthest target neighbour of `i`
    fn impostor_candidates(&self, proj: ArrayView2<F>) -> Vec<(usize, usize)> {
        let mut candidates = Vec::new();
        for (i, neighbours) in self.targets.iter().enumerate() {
            let margin = neighbours
                .iter()
                .map(|&j| sq_dist(proj.row(i), proj.row(j)))
                .fold(F::zero(), F::max)
                + F::one();

            for l in 0..proj.nrows() {
                if !self.classes.same(i, l) && sq_dist(proj.row(i), proj.row(l)) < margin {
                    candidates.push((i, l));
                }
            }
        }

        candidates
    }

    /// Objective and gradient in `M` for the records projected into the current space
    ///
    /// Only the given impostor pairs are checked for margin violations.
    fn evaluate(&self, proj: ArrayView2<F>, impostors: &[(usize, usize)]) -> Evaluation<F> {
        let reg = self.regularization;
        let target_dist = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, neighbours)| {
                neighbours
                    .iter()
                    .map(|&j| sq_dist(proj.row(i), proj.row(j)))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let mut objective = reg * target_dist.iter().flatten().copied().sum::<F>();
        let mut weights = Array2::zeros((proj.nrows(), proj.nrows()));
        let mut n_active = 0;

        for &(i, l) in impostors {
            let dist_il = sq_dist(proj.row(i), proj.row(l));
            for (&j, &dist_ij) in self.targets[i].iter().zip(&target_dist[i]) {
                let violation = F::one() + dist_ij - dist_il;
                if violation > F::zero() {
                    objective += (F::one() - reg) * violation;
                    weights[(i, j)] += F::one();
                    weights[(i, l)] -= F::one();
                    n_active += 1;
                }
            }
        }

        let push = scatter(self.x, &weights);
        Evaluation {
            objective,
            gradient: &self.pull * reg + push * (F::one() - reg),
            n_active,
        }
    }
}

/// Weighted sum of outer products `Σ w_ij (x_i − x_j)(x_i − x_j)ᵀ`
fn scatter<F: Float>(x: ArrayView2<F>, weights: &Array2<F>) -> Array2<F> {
    let symmetric = weights + &weights.t();
    symmetric.laplacian_form(&x)
}

/// The `k` nearest records of the same class for every record, ties go to the lower index
fn target_neighbours<F: Float, D: Data<Elem = F>>(
    x: &ArrayBase<D, Ix2>,
    classes: &Classes,
    k: usize,
) -> Result<Vec<Vec<usize>>> {
    let dist = sq_distances(x);
    let mut targets = vec![Vec::new(); x.nrows()];

    for members in &classes.members {
        if members.len() <= k {
            return Err(SupervisedError::ClassTooSmall {
                size: members.len(),
                k,
            });
        }

        for &i in members {
            let mut others = members.iter().copied().filter(|&j| j != i).collect::<Vec<_>>();
            others.sort_by(|&a, &b| {
                dist[(i, a)]
                    .partial_cmp(&dist[(i, b)])
                    .unwrap_or(Ordering::Equal)
                    .then(a.cmp(&b))
            });
            others.truncate(k);
            targets[i] = others;
        }
    }

    Ok(targets)
}
