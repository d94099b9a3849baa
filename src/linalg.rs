//! Dense symmetric-matrix toolbox shared by the learners
//!
//! Every learner works on small `d×d` symmetric matrices (Mahalanobis matrices, scatter and
//! covariance matrices). The routines here wrap the pure Rust decompositions of
//! `linfa-linalg` and add the spectral helpers on top of them: sorted eigendecomposition, PSD
//! projection, (pseudo-)inverses, inverse square roots and the generalized symmetric
//! eigenproblem.
use linfa_linalg::{cholesky::Cholesky, eigh::Eigh};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};

use crate::error::{Error, Result};
use crate::Float;

/// Symmetric part `(A + Aᵀ) / 2` of a square matrix
pub fn symmetrize<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>) -> Array2<F> {
    (a + &a.t()) * F::cast(0.5)
}

/// Eigendecomposition of the symmetric part of `a`
///
/// Eigenvalues are returned in ascending order, eigenvectors are the columns of the second
/// matrix in the same order.
pub fn eigh_sorted<F: Float, D: Data<Elem = F>>(
    a: &ArrayBase<D, Ix2>,
) -> Result<(Array1<F>, Array2<F>)> {
    if !a.is_square() {
        return Err(Error::InputShape(format!(
            "expected a square matrix, got {:?}",
            a.dim()
        )));
    }

    let (vals, vecs) = symmetrize(a).eigh()?;
    if vals.iter().chain(vecs.iter()).any(|x| !x.is_finite()) {
        return Err(Error::NumericalInstability(
            "eigendecomposition produced non-finite values".into(),
        ));
    }

    let mut order = (0..vals.len()).collect::<Vec<_>>();
    order.sort_by(|&i, &j| vals[i].partial_cmp(&vals[j]).unwrap_or(std::cmp::Ordering::Equal));

    Ok((vals.select(Axis(0), &order), vecs.select(Axis(1), &order)))
}

/// Recompose `V diag(w) Vᵀ` from an eigendecomposition
pub fn from_eigen<F: Float>(vals: ArrayView1<F>, vecs: ArrayView2<F>) -> Array2<F> {
    (&vecs * &vals).dot(&vecs.t())
}

/// Project a symmetric matrix onto the cone of matrices with eigenvalues `>= floor`
///
/// With `floor = 0` this is the nearest PSD matrix in Frobenius norm.
pub fn clip_eigenvalues<F: Float, D: Data<Elem = F>>(
    a: &ArrayBase<D, Ix2>,
    floor: F,
) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(a)?;
    let vals = vals.mapv(|v| v.max(floor));

    Ok(from_eigen(vals.view(), vecs.view()))
}

fn singular_cutoff<F: Float>(vals: &Array1<F>) -> F {
    let largest = vals.iter().fold(F::zero(), |acc, v| acc.max(v.abs()));
    largest * F::cast(vals.len()) * F::epsilon()
}

fn rank_cutoff<F: Float>(vals: &Array1<F>) -> F {
    let largest = vals.iter().fold(F::zero(), |acc, v| acc.max(v.abs()));
    largest * F::epsilon().sqrt()
}

/// Pseudo-inverse of a symmetric matrix
///
/// Eigenvalues below `√ε` times the largest one in magnitude are treated as zero.
pub fn pinvh<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(a)?;
    let cutoff = rank_cutoff(&vals);
    let vals = vals.mapv(|v| if v.abs() > cutoff { v.recip() } else { F::zero() });

    Ok(from_eigen(vals.view(), vecs.view()))
}

/// Inverse of a symmetric positive definite matrix
///
/// Fails with `SingularMatrix` if an eigenvalue is not clearly positive. `what` names the
/// matrix in the error message.
pub fn inv_spd<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>, what: &str) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(a)?;
    check_positive(&vals, what)?;

    let vals = vals.mapv(|v| v.recip());
    Ok(from_eigen(vals.view(), vecs.view()))
}

/// Inverse square root `A^{-1/2}` of a symmetric positive definite matrix
pub fn inv_sqrtm<F: Float, D: Data<Elem = F>>(
    a: &ArrayBase<D, Ix2>,
    what: &str,
) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(a)?;
    check_positive(&vals, what)?;

    let vals = vals.mapv(|v| v.sqrt().recip());
    Ok(from_eigen(vals.view(), vecs.view()))
}

fn check_positive<F: Float>(vals: &Array1<F>, what: &str) -> Result<()> {
    let cutoff = singular_cutoff(vals);
    match vals.iter().next() {
        Some(&smallest) if smallest > cutoff => Ok(()),
        Some(&smallest) => Err(Error::SingularMatrix(format!(
            "{} has smallest eigenvalue {}",
            what, smallest
        ))),
        None => Err(Error::InputShape(format!("{} is empty", what))),
    }
}

/// Positive definite version of a symmetric matrix, adding a growing ridge if needed
///
/// A matrix whose eigenvalues are all clearly positive is returned as is. Otherwise
/// `ε tr(A)/d` is added to the diagonal with `ε` growing tenfold from `1e-10` up to `1`,
/// and the first positive definite result is returned. Fails with `SingularMatrix` if no
/// ridge helps, which is the case for a matrix with a non-positive trace.
pub fn regularize<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>, what: &str) -> Result<Array2<F>> {
    let (vals, _) = eigh_sorted(a)?;
    if vals.is_empty() {
        return Err(Error::InputShape(format!("{} is empty", what)));
    }

    let base = symmetrize(a);
    if vals[0] > rank_cutoff(&vals) {
        return Ok(base);
    }

    let scale = base.diag().sum() / F::cast(base.nrows());
    if scale > F::zero() {
        for exponent in (0..=10).rev() {
            let ridge = scale * F::cast(10f64.powi(-exponent));
            let mut shifted = base.clone();
            shifted.diag_mut().mapv_inplace(|v| v + ridge);

            let (vals, _) = eigh_sorted(&shifted)?;
            if vals[0] > rank_cutoff(&vals) {
                log::warn!(
                    "{} is singular (smallest eigenvalue {}), adding ridge {}",
                    what,
                    vals[0] - ridge,
                    ridge
                );
                return Ok(shifted);
            }
        }
    }

    Err(Error::SingularMatrix(format!(
        "{} is not invertible even after regularization",
        what
    )))
}

/// Orthonormal basis, as columns, of the numerical range of a symmetric matrix
///
/// Directions with an eigenvalue below `√ε` times the largest one are treated as null.
pub fn range_basis<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(a)?;
    let cutoff = rank_cutoff(&vals);
    let kept = (0..vals.len())
        .filter(|&k| vals[k] > cutoff)
        .collect::<Vec<_>>();

    Ok(vecs.select(Axis(1), &kept))
}

/// Factor a PSD Mahalanobis matrix as `M = LᵀL`
///
/// The rows of `L` are the eigenvectors of `M` scaled by the square root of their eigenvalue,
/// ordered by descending eigenvalue. Small negative eigenvalues from rounding are treated as
/// zero.
pub fn factor_metric<F: Float, D: Data<Elem = F>>(m: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let (vals, vecs) = eigh_sorted(m)?;
    let n = vals.len();

    let mut l = Array2::zeros((n, n));
    for (mut row, k) in l.axis_iter_mut(Axis(0)).zip((0..n).rev()) {
        let scale = vals[k].max(F::zero()).sqrt();
        row.assign(&(&vecs.column(k) * scale));
    }

    Ok(l)
}

/// Log-determinant of a symmetric matrix, `None` if it is not positive definite
pub fn log_det<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>) -> Option<F> {
    let lower = a.cholesky().ok()?;
    let diag = lower.diag();
    if diag.iter().any(|x| !x.is_finite() || *x <= F::zero()) {
        return None;
    }

    Some(diag.iter().map(|x| x.ln()).sum::<F>() * F::cast(2.0))
}

/// Whether a Cholesky factorization of the matrix succeeds
pub fn is_positive_definite<F: Float, D: Data<Elem = F>>(a: &ArrayBase<D, Ix2>) -> bool {
    log_det(a).is_some()
}

/// Solve the generalized symmetric eigenproblem `A v = λ B v` for positive definite `B`
///
/// The problem is reduced to the standard one with `B^{-1/2} A B^{-1/2}`. A singular `B` is
/// first made definite with [`regularize`]. Eigenvalues are ascending and the returned
/// eigenvectors (columns) are `B`-orthonormal.
pub fn generalized_eigh<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    a: &ArrayBase<D1, Ix2>,
    b: &ArrayBase<D2, Ix2>,
    what: &str,
) -> Result<(Array1<F>, Array2<F>)> {
    if a.dim() != b.dim() {
        return Err(Error::InputShape(format!(
            "generalized eigenproblem with {:?} and {:?}",
            a.dim(),
            b.dim()
        )));
    }

    let whiten = inv_sqrtm(&regularize(b, what)?, what)?;
    let reduced = whiten.dot(a).dot(&whiten);
    let (vals, vecs) = eigh_sorted(&reduced)?;

    Ok((vals, whiten.dot(&vecs)))
}

/// Covariance of the rows of `x` with `ddof` delta degrees of freedom
pub fn covariance<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>, ddof: usize) -> Result<Array2<F>> {
    let n = x.nrows();
    if n <= ddof {
        return Err(Error::NotEnoughSamples(format!(
            "covariance of {} samples with ddof {}",
            n, ddof
        )));
    }

    let mean = x.sum_axis(Axis(0)) / F::cast(n);
    let centered = x - &mean;

    Ok(centered.t().dot(&centered) / F::cast(n - ddof))
}

/// Orthonormalize the columns of `a` with modified Gram-Schmidt
///
/// Columns which are linearly dependent on their predecessors are set to zero.
pub fn orthonormalize_columns<F: Float>(a: &Array2<F>) -> Array2<F> {
    let mut q = a.clone();

    for k in 0..q.ncols() {
        for prev in 0..k {
            let proj = q.column(prev).dot(&q.column(k));
            let basis = q.column(prev).to_owned();
            q.column_mut(k).scaled_add(-proj, &basis);
        }

        let norm = q.column(k).dot(&q.column(k)).sqrt();
        if norm > F::epsilon() {
            q.column_mut(k).mapv_inplace(|v| v / norm);
        } else {
            q.column_mut(k).fill(F::zero());
        }
    }

    q
}

/// Euclidean distances between all pairs of rows of `a` and `b`
pub fn pairwise_distances<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    a: &ArrayBase<D1, Ix2>,
    b: &ArrayBase<D2, Ix2>,
) -> Array2<F> {
    let mut dist = Array2::zeros((a.nrows(), b.nrows()));
    for (mut row, x) in dist.axis_iter_mut(Axis(0)).zip(a.axis_iter(Axis(0))) {
        for (d, y) in row.iter_mut().zip(b.axis_iter(Axis(0))) {
            *d = x
                .iter()
                .zip(y.iter())
                .map(|(u, v)| (*u - *v) * (*u - *v))
                .sum::<F>()
                .sqrt();
        }
    }

    dist
}

/// Outer product `u vᵀ`
pub fn outer<F: Float>(u: ArrayView1<F>, v: ArrayView1<F>) -> Array2<F> {
    let col = u.insert_axis(Axis(1));
    let row = v.insert_axis(Axis(0));
    col.dot(&row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn spd() -> Array2<f64> {
        array![[4., 1., 0.5], [1., 3., 0.2], [0.5, 0.2, 2.]]
    }

    #[test]
    fn sorted_eigenpairs_reconstruct() {
        let a = spd();
        let (vals, vecs) = eigh_sorted(&a).unwrap();

        assert!(vals.windows(2).into_iter().all(|w| w[0] <= w[1]));
        assert_abs_diff_eq!(from_eigen(vals.view(), vecs.view()), a, epsilon = 1e-10);
        assert_abs_diff_eq!(vecs.t().dot(&vecs), Array2::eye(3), epsilon = 1e-10);
    }

    #[test]
    fn clipping_removes_negative_eigenvalues() {
        let a = array![[1., 2.], [2., 1.]];
        let clipped = clip_eigenvalues(&a, 0.).unwrap();

        // eigenvalues 3 and -1, only the positive direction (1, 1) survives
        assert_abs_diff_eq!(clipped, array![[1.5, 1.5], [1.5, 1.5]], epsilon = 1e-10);
    }

    #[test]
    fn inverses_agree() {
        let a = spd();
        let inv = inv_spd(&a, "test").unwrap();
        assert_abs_diff_eq!(inv.dot(&a), Array2::eye(3), epsilon = 1e-10);
        assert_abs_diff_eq!(pinvh(&a).unwrap(), inv, epsilon = 1e-10);

        let isq = inv_sqrtm(&a, "test").unwrap();
        assert_abs_diff_eq!(isq.dot(&a).dot(&isq), Array2::eye(3), epsilon = 1e-10);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = array![[1., 1.], [1., 1.]];
        assert!(matches!(inv_spd(&a, "ones"), Err(Error::SingularMatrix(_))));
        assert!(matches!(inv_sqrtm(&a, "ones"), Err(Error::SingularMatrix(_))));
        assert!(!is_positive_definite(&a));

        let pinv = pinvh(&a).unwrap();
        assert_abs_diff_eq!(pinv, array![[0.25, 0.25], [0.25, 0.25]], epsilon = 1e-10);
    }

    #[test]
    fn singular_matrix_is_regularized() {
        let a = spd();
        assert_abs_diff_eq!(regularize(&a, "spd").unwrap(), a);

        let ones = array![[1., 1.], [1., 1.]];
        let reg = regularize(&ones, "ones").unwrap();
        assert_abs_diff_eq!(reg, ones, epsilon = 1e-6);
        assert!(is_positive_definite(&reg));
        assert!(inv_sqrtm(&reg, "ones").is_ok());

        let zero = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            regularize(&zero, "zero"),
            Err(Error::SingularMatrix(msg)) if msg.contains("even after regularization")
        ));
    }

    #[test]
    fn range_of_rank_deficient_matrix() {
        // duplicated second coordinate
        let a = array![[2., 0., 0.], [0., 1., 1.], [0., 1., 1.]];
        let basis = range_basis(&a).unwrap();

        assert_eq!(basis.dim(), (3, 2));
        assert_abs_diff_eq!(basis.t().dot(&basis), Array2::eye(2), epsilon = 1e-10);
        let null = array![0., 1., -1.];
        assert_abs_diff_eq!(basis.t().dot(&null), Array1::zeros(2), epsilon = 1e-10);
    }

    #[test]
    fn factor_reproduces_metric() {
        let m = spd();
        let l = factor_metric(&m).unwrap();
        assert_abs_diff_eq!(l.t().dot(&l), m, epsilon = 1e-10);

        let row_norms = l.map_axis(Axis(1), |r| r.dot(&r));
        assert!(row_norms[0] >= row_norms[1] && row_norms[1] >= row_norms[2]);
    }

    #[test]
    fn log_det_of_diagonal() {
        let a = array![[2., 0.], [0., 3.]];
        assert_abs_diff_eq!(log_det(&a).unwrap(), 6f64.ln(), epsilon = 1e-12);
        assert!(log_det(&array![[1., 0.], [0., -1.]]).is_none());
    }

    #[test]
    fn generalized_problem_is_b_orthonormal() {
        let a = array![[2., 1.], [1., 3.]];
        let b = array![[2., 0.5], [0.5, 1.]];
        let (vals, vecs) = generalized_eigh(&a, &b, "b").unwrap();

        assert_abs_diff_eq!(vecs.t().dot(&b).dot(&vecs), Array2::eye(2), epsilon = 1e-10);
        for k in 0..2 {
            let v = vecs.column(k);
            assert_abs_diff_eq!(a.dot(&v), b.dot(&v) * vals[k], epsilon = 1e-10);
        }
    }

    #[test]
    fn covariance_matches_hand_computation() {
        let x = array![[1., 2.], [3., 6.], [5., 10.]];
        let cov = covariance(&x, 1).unwrap();
        assert_abs_diff_eq!(cov, array![[4., 8.], [8., 16.]], epsilon = 1e-12);
        assert!(covariance(&x.slice(ndarray::s![..1, ..]), 1).is_err());
    }

    #[test]
    fn gram_schmidt_columns() {
        let a = array![[1., 1., 2.], [0., 1., 2.], [0., 0., 0.]];
        let q = orthonormalize_columns(&a);

        assert_abs_diff_eq!(q.column(0), array![1., 0., 0.], epsilon = 1e-12);
        assert_abs_diff_eq!(q.column(1), array![0., 1., 0.], epsilon = 1e-12);
        assert_abs_diff_eq!(q.column(2), array![0., 0., 0.], epsilon = 1e-12);
    }

    #[test]
    fn distances_between_rows() {
        let a = array![[0., 0.], [3., 4.]];
        let dist = pairwise_distances(&a, &a);
        assert_abs_diff_eq!(dist, array![[0., 5.], [5., 0.]], epsilon = 1e-12);
        assert_abs_diff_eq!(
            outer(array![1., 2.].view(), array![3., 4.].view()),
            array![[3., 4.], [6., 8.]]
        );
    }
}
