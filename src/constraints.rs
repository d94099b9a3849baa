//! Weak supervision attached to the records of a dataset
//!
//! Weakly-supervised learners never see class labels. Instead they are given relations between
//! records, stored as indices into the record matrix:
//!
//! * [`Quadruplets`]: relative comparisons `d(a, b) < d(c, d)`,
//! * [`Pairs`]: pairs which should be similar or dissimilar,
//! * [`Chunklets`]: small groups of records known to share their class,
//! * similarity graphs, see [`graph`](crate::graph).
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn check_indices(indices: ArrayView2<usize>, n: usize, what: &str) -> Result<()> {
    match indices.iter().find(|&&idx| idx >= n) {
        Some(idx) => Err(Error::InputShape(format!(
            "{} index {} out of range for {} records",
            what, idx, n
        ))),
        None => Ok(()),
    }
}

/// Relative comparisons: every row `(a, b, c, d)` asks for `d(a, b) < d(c, d)`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Quadruplets {
    indices: Array2<usize>,
}

impl Quadruplets {
    /// Create quadruplets from an `m×4` index array
    pub fn new(indices: Array2<usize>) -> Result<Self> {
        if indices.ncols() != 4 {
            return Err(Error::InputShape(format!(
                "quadruplets need four columns, got {}",
                indices.ncols()
            )));
        }

        Ok(Quadruplets { indices })
    }

    /// The `m×4` index array
    pub fn indices(&self) -> ArrayView2<'_, usize> {
        self.indices.view()
    }

    pub fn len(&self) -> usize {
        self.indices.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check every index against the number of records
    pub fn check_records(&self, n: usize) -> Result<()> {
        check_indices(self.indices.view(), n, "quadruplet")
    }
}

/// Similar and dissimilar pairs of records
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Pairs {
    similar: Array2<usize>,
    dissimilar: Array2<usize>,
}

impl Pairs {
    /// Create pairs from two `m×2` index arrays
    pub fn new(similar: Array2<usize>, dissimilar: Array2<usize>) -> Result<Self> {
        for (pairs, what) in [(&similar, "similar"), (&dissimilar, "dissimilar")].iter() {
            if pairs.ncols() != 2 {
                return Err(Error::InputShape(format!(
                    "{} pairs need two columns, got {}",
                    what,
                    pairs.ncols()
                )));
            }
        }

        Ok(Pairs {
            similar,
            dissimilar,
        })
    }

    /// Create pairs from `(i, j, sign)` rows, a positive sign marks a similar pair and a
    /// negative sign a dissimilar pair
    pub fn from_signed<D: Data<Elem = i64>>(tuples: &ArrayBase<D, Ix2>) -> Result<Self> {
        if tuples.ncols() != 3 {
            return Err(Error::InputShape(format!(
                "signed pairs need three columns, got {}",
                tuples.ncols()
            )));
        }

        let mut similar = Vec::new();
        let mut dissimilar = Vec::new();
        for row in tuples.axis_iter(Axis(0)) {
            if row[0] < 0 || row[1] < 0 {
                return Err(Error::InputShape(format!(
                    "negative index in pair ({}, {})",
                    row[0], row[1]
                )));
            }
            let pair = [row[0] as usize, row[1] as usize];
            match row[2] {
                s if s > 0 => similar.extend_from_slice(&pair),
                s if s < 0 => dissimilar.extend_from_slice(&pair),
                _ => {
                    return Err(Error::InputShape(format!(
                        "pair ({}, {}) has sign zero",
                        row[0], row[1]
                    )))
                }
            }
        }

        let n_similar = similar.len() / 2;
        let n_dissimilar = dissimilar.len() / 2;
        Pairs::new(
            Array2::from_shape_vec((n_similar, 2), similar)?,
            Array2::from_shape_vec((n_dissimilar, 2), dissimilar)?,
        )
    }

    pub fn similar(&self) -> ArrayView2<'_, usize> {
        self.similar.view()
    }

    pub fn dissimilar(&self) -> ArrayView2<'_, usize> {
        self.dissimilar.view()
    }

    /// Total number of pairs
    pub fn len(&self) -> usize {
        self.similar.nrows() + self.dissimilar.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every index against the number of records
    pub fn check_records(&self, n: usize) -> Result<()> {
        check_indices(self.similar.view(), n, "similar pair")?;
        check_indices(self.dissimilar.view(), n, "dissimilar pair")
    }
}

/// Chunklet membership of every record, `None` marks a record outside of all chunklets
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Chunklets {
    ids: Array1<Option<usize>>,
}

impl Chunklets {
    pub fn new(ids: Array1<Option<usize>>) -> Self {
        Chunklets { ids }
    }

    /// Create chunklets from signed ids, every negative id is the "unassigned" sentinel
    pub fn from_signed<D: Data<Elem = i64>>(ids: &ArrayBase<D, Ix1>) -> Self {
        Chunklets {
            ids: ids.mapv(|id| if id < 0 { None } else { Some(id as usize) }),
        }
    }

    pub fn ids(&self) -> &Array1<Option<usize>> {
        &self.ids
    }

    /// Number of records covered, assigned or not
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record indices of every chunklet, ordered by chunklet id
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let n_chunks = self.ids.iter().flatten().map(|id| id + 1).max().unwrap_or(0);
        let mut groups = vec![Vec::new(); n_chunks];
        for (idx, id) in self.ids.iter().enumerate() {
            if let Some(id) = id {
                groups[*id].push(idx);
            }
        }

        groups.into_iter().filter(|g| !g.is_empty()).collect()
    }

    /// Check the number of ids against the number of records
    pub fn check_records(&self, n: usize) -> Result<()> {
        if self.ids.len() != n {
            return Err(Error::InputShape(format!(
                "{} chunklet ids for {} records",
                self.ids.len(),
                n
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn signed_pairs_are_split() {
        let pairs = Pairs::from_signed(&array![[0i64, 1, 1], [2, 3, -1], [1, 4, 1]]).unwrap();

        assert_eq!(pairs.similar(), array![[0, 1], [1, 4]]);
        assert_eq!(pairs.dissimilar(), array![[2, 3]]);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.check_records(5).is_ok());
        assert!(pairs.check_records(4).is_err());

        assert!(Pairs::from_signed(&array![[0i64, 1, 0]]).is_err());
        assert!(Pairs::from_signed(&array![[0i64, 1]]).is_err());
    }

    #[test]
    fn quadruplets_shape() {
        assert!(Quadruplets::new(array![[0, 1, 2]]).is_err());

        let quads = Quadruplets::new(array![[0, 1, 2, 3], [3, 2, 1, 0]]).unwrap();
        assert_eq!(quads.len(), 2);
        assert!(quads.check_records(4).is_ok());
        assert!(quads.check_records(3).is_err());
    }

    #[test]
    fn chunklets_from_sentinel() {
        let chunks = Chunklets::from_signed(&array![-1i64, 0, 0, 2, -1, 2, 2]);

        assert_eq!(chunks.groups(), vec![vec![1, 2], vec![3, 5, 6]]);
        assert_eq!(chunks.ids()[0], None);
        assert!(chunks.check_records(7).is_ok());
        assert!(chunks.check_records(6).is_err());
    }
}
