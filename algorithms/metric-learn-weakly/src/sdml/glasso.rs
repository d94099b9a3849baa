//! Sparse inverse covariance estimation
//!
//! The graphical lasso solves `max log det P − tr(S P) − α Σ_{i≠j} |P_ij|` by block
//! coordinate descent over the columns of the covariance estimate. Every column is a lasso
//! problem on the Gram matrix of the remaining columns, solved by cyclic coordinate descent
//! with soft thresholding.
use metric_learn::linalg::{pinvh, symmetrize};
use metric_learn::Float;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::Result;

/// Maximal number of coordinate descent sweeps of a single lasso problem
const LASSO_MAX_ITER: usize = 1000;
/// Relative change of the lasso coefficients to stop at
const LASSO_TOL: f64 = 1e-8;
/// Shrinkage of the off-diagonal entries of the starting covariance
const OFF_DIAGONAL_SHRINK: f64 = 0.95;

fn soft_threshold<F: Float>(value: F, threshold: F) -> F {
    value.signum() * (value.abs() - threshold).max(F::zero())
}

/// Minimise `½ wᵀQw − qᵀw + α‖w‖₁` starting from `w`
fn lasso_gram<F: Float>(
    mut w: Array1<F>,
    alpha: F,
    gram: ArrayView2<F>,
    target: ArrayView1<F>,
) -> Array1<F> {
    // running product `Q·w`
    let mut qw = gram.dot(&w);

    for _ in 0..LASSO_MAX_ITER {
        let mut w_max = F::zero();
        let mut d_max = F::zero();

        for i in 0..w.len() {
            let q_ii = gram[(i, i)];
            if q_ii == F::zero() {
                continue;
            }

            let old = w[i];
            if old != F::zero() {
                qw.scaled_add(-old, &gram.row(i));
            }

            w[i] = soft_threshold(target[i] - qw[i], alpha) / q_ii;
            if w[i] != F::zero() {
                qw.scaled_add(w[i], &gram.row(i));
            }

            d_max = d_max.max((w[i] - old).abs());
            w_max = w_max.max(w[i].abs());
        }

        if w_max == F::zero() || d_max / w_max < F::cast(LASSO_TOL) {
            break;
        }
    }

    w
}

/// Dual gap of the graphical lasso at precision `precision`
fn dual_gap<F: Float>(emp_cov: &Array2<F>, precision: &Array2<F>, alpha: F) -> F {
    let off_diagonal =
        precision.mapv(|v| v.abs()).sum() - precision.diag().mapv(|v| v.abs()).sum();

    (emp_cov * precision).sum() - F::cast(emp_cov.nrows()) + alpha * off_diagonal
}

/// Sparse precision matrix of the empirical covariance `emp_cov` with L1 penalty `alpha`
///
/// Returns the precision matrix, the number of sweeps over all columns and whether the dual
/// gap fell below `tol`.
pub fn graphical_lasso<F: Float>(
    emp_cov: &Array2<F>,
    alpha: F,
    max_iter: usize,
    tol: F,
) -> Result<(Array2<F>, usize, bool)> {
    let p = emp_cov.nrows();

    let mut covariance = emp_cov.clone();
    for ((i, j), v) in covariance.indexed_iter_mut() {
        if i != j {
            *v *= F::cast(OFF_DIAGONAL_SHRINK);
        }
    }
    let mut precision = pinvh(&covariance)?;

    let mut n_iter = 0;
    let mut converged = false;
    if p < 2 {
        return Ok((precision, n_iter, true));
    }

    for iteration in 0..max_iter {
        n_iter = iteration + 1;

        for idx in 0..p {
            let rest = (0..p).filter(|&j| j != idx).collect::<Vec<_>>();
            let sub_covariance = covariance.select(Axis(0), &rest).select(Axis(1), &rest);
            let target = emp_cov.row(idx).select(Axis(0), &rest);

            // warm start from the current precision
            let scale = precision[(idx, idx)] + F::cast(1000.) * F::epsilon();
            let start = precision.column(idx).select(Axis(0), &rest).mapv(|v| -v / scale);
            let coefs = lasso_gram(start, alpha, sub_covariance.view(), target.view());

            let column = covariance.column(idx).select(Axis(0), &rest);
            let diagonal = (covariance[(idx, idx)] - column.dot(&coefs)).recip();
            if !diagonal.is_finite() || diagonal <= F::zero() {
                return Err(metric_learn::Error::NumericalInstability(format!(
                    "graphical lasso lost positive definiteness in column {}",
                    idx
                ))
                .into());
            }

            precision[(idx, idx)] = diagonal;
            let updated = sub_covariance.dot(&coefs);
            for (k, &j) in rest.iter().enumerate() {
                precision[(j, idx)] = -diagonal * coefs[k];
                precision[(idx, j)] = -diagonal * coefs[k];
                covariance[(j, idx)] = updated[k];
                covariance[(idx, j)] = updated[k];
            }
        }

        let gap = dual_gap(emp_cov, &precision, alpha);
        log::debug!("graphical lasso sweep {}: dual gap {}", n_iter, gap);
        if gap.abs() < tol {
            converged = true;
            break;
        }
    }

    Ok((symmetrize(&precision), n_iter, converged))
}
