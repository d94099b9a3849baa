//! Similarity graphs over the records of a dataset
//!
//! A graph is an `n×n` symmetric weighted adjacency matrix, positive weights mark pairs which
//! should be close and negative weights pairs which should be far apart. Learners only need a
//! small capability set of the graph, which lets dense arrays and sparse matrices share the
//! same code path.
use ndarray::prelude::*;
use ndarray::Data;
use sprs::{CsMat, CsMatView};

use crate::error::{Error, Result};
use crate::Float;

/// Capabilities a similarity graph must provide
pub trait SimilarityGraph {
    type Elem: Float;

    /// Shape of the adjacency matrix
    fn shape(&self) -> (usize, usize);

    /// Sum of the weights of every row
    fn row_sums(&self) -> Array1<Self::Elem>;

    /// Matrix product `W·X` with a dense matrix
    fn dot_dense(&self, rhs: &ArrayView2<Self::Elem>) -> Array2<Self::Elem>;

    /// Number of stored entries
    fn n_edges(&self) -> usize;

    /// Whether the adjacency matrix is stored sparse
    fn is_sparse(&self) -> bool;

    /// Quadratic form `XᵀLX` of the graph Laplacian `L = diag(row_sums) − W`
    ///
    /// This equals `Σ_{i<j} w_ij (x_i − x_j)(x_i − x_j)ᵀ`, self loops do not contribute.
    fn laplacian_form(&self, x: &ArrayView2<Self::Elem>) -> Array2<Self::Elem> {
        let degree = self.row_sums().insert_axis(Axis(1));
        let weighted = x * &degree - self.dot_dense(x);

        x.t().dot(&weighted)
    }

    /// Check that the graph covers exactly `n` records
    fn check_nodes(&self, n: usize) -> Result<()> {
        let shape = self.shape();
        if shape != (n, n) {
            return Err(Error::InputShape(format!(
                "graph of shape {:?} does not match {} records",
                shape, n
            )));
        }

        Ok(())
    }
}

impl<F: Float, D: Data<Elem = F>> SimilarityGraph for ArrayBase<D, Ix2> {
    type Elem = F;

    fn shape(&self) -> (usize, usize) {
        self.dim()
    }

    fn row_sums(&self) -> Array1<F> {
        self.sum_axis(Axis(1))
    }

    fn dot_dense(&self, rhs: &ArrayView2<F>) -> Array2<F> {
        self.dot(rhs)
    }

    fn n_edges(&self) -> usize {
        self.iter().filter(|x| !x.is_zero()).count()
    }

    fn is_sparse(&self) -> bool {
        false
    }
}

impl<F: Float> SimilarityGraph for CsMat<F> {
    type Elem = F;

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    fn row_sums(&self) -> Array1<F> {
        SimilarityGraph::row_sums(&self.view())
    }

    fn dot_dense(&self, rhs: &ArrayView2<F>) -> Array2<F> {
        SimilarityGraph::dot_dense(&self.view(), rhs)
    }

    fn n_edges(&self) -> usize {
        self.nnz()
    }

    fn is_sparse(&self) -> bool {
        true
    }
}

impl<'a, F: Float> SimilarityGraph for CsMatView<'a, F> {
    type Elem = F;

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    fn row_sums(&self) -> Array1<F> {
        let mut sum = Array1::zeros(self.rows());
        for (val, (row, _)) in self.iter() {
            sum[row] += *val;
        }

        sum
    }

    fn dot_dense(&self, rhs: &ArrayView2<F>) -> Array2<F> {
        let mut out = Array2::zeros((self.rows(), rhs.ncols()));
        for (val, (row, col)) in self.iter() {
            out.row_mut(row).scaled_add(*val, &rhs.row(col));
        }

        out
    }

    fn n_edges(&self) -> usize {
        self.nnz()
    }

    fn is_sparse(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sprs::TriMat;

    fn dense_graph() -> Array2<f64> {
        array![[0., 1., -1.], [1., 0., 0.], [-1., 0., 2.]]
    }

    fn sparse_graph() -> CsMat<f64> {
        let mut tri = TriMat::new((3, 3));
        tri.add_triplet(0, 1, 1.);
        tri.add_triplet(1, 0, 1.);
        tri.add_triplet(0, 2, -1.);
        tri.add_triplet(2, 0, -1.);
        tri.add_triplet(2, 2, 2.);
        tri.to_csr()
    }

    #[test]
    fn dense_and_sparse_agree() {
        let x = array![[1., 0.], [0., 2.], [3., 1.]];
        let dense = dense_graph();
        let sparse = sparse_graph();

        assert_abs_diff_eq!(dense.row_sums(), sparse.row_sums());
        assert_abs_diff_eq!(dense.dot_dense(&x.view()), sparse.dot_dense(&x.view()));
        assert_abs_diff_eq!(
            dense.laplacian_form(&x.view()),
            sparse.view().laplacian_form(&x.view()),
            epsilon = 1e-12
        );
        assert_eq!(dense.n_edges(), sparse.n_edges());
        assert!(!dense.is_sparse() && sparse.is_sparse());
    }

    #[test]
    fn laplacian_is_sum_over_edges() {
        let x = array![[1., 0.], [0., 2.], [3., 1.]];
        let form = dense_graph().laplacian_form(&x.view());

        // w_01 = 1 and w_02 = -1, the self loop on node 2 cancels
        let d01 = array![1., -2.];
        let d02 = array![-2., -1.];
        let expected = crate::linalg::outer(d01.view(), d01.view())
            - crate::linalg::outer(d02.view(), d02.view());
        assert_abs_diff_eq!(form, expected, epsilon = 1e-12);
    }

    #[test]
    fn node_count_is_checked() {
        assert!(dense_graph().check_nodes(3).is_ok());
        assert!(sparse_graph().check_nodes(4).is_err());
    }
}
