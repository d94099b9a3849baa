//! Draw weak supervision from class labels
//!
//! The weakly-supervised learners consume constraints, in practice they are often generated
//! from a partially labeled dataset. All samplers take the random number generator from the
//! caller, seeding is left to the application.
use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::constraints::{Chunklets, Pairs, Quadruplets};
use crate::dataset::{label_indices, Label};
use crate::error::{Error, Result};
use crate::Float;

/// Number of rounds spent to find distinct pairs
const MAX_PAIR_ROUNDS: usize = 10;

/// Labels reduced to dense class ids with the members of every class
struct Classes {
    class_of: Array1<usize>,
    members: Vec<Vec<usize>>,
}

impl Classes {
    fn new<L: Label>(labels: ArrayView1<L>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::NotEnoughSamples("no labels to sample from".into()));
        }

        let (class_of, n_classes) = label_indices(labels);
        let mut members = vec![Vec::new(); n_classes];
        for (idx, class) in class_of.iter().enumerate() {
            members[*class].push(idx);
        }

        Ok(Classes { class_of, members })
    }

    fn len(&self) -> usize {
        self.class_of.len()
    }

    /// A random record of the same class, possibly `idx` itself
    fn same<R: Rng>(&self, idx: usize, rng: &mut R) -> usize {
        let members = &self.members[self.class_of[idx]];
        members[rng.gen_range(0..members.len())]
    }

    /// A random record of any other class, `None` if there is a single class
    fn other<R: Rng>(&self, idx: usize, rng: &mut R) -> Option<usize> {
        let outside = self.len() - self.members[self.class_of[idx]].len();
        if outside == 0 {
            return None;
        }

        // walk over the records of the other classes without materializing them
        let mut pick = rng.gen_range(0..outside);
        for (class, members) in self.members.iter().enumerate() {
            if class == self.class_of[idx] {
                continue;
            }
            if pick < members.len() {
                return Some(members[pick]);
            }
            pick -= members.len();
        }

        None
    }

    fn distinct_pairs<R: Rng>(&self, num: usize, similar: bool, rng: &mut R) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(num);

        for _ in 0..MAX_PAIR_ROUNDS {
            if pairs.len() >= num {
                break;
            }
            for _ in 0..num - pairs.len() {
                let a = rng.gen_range(0..self.len());
                let b = if similar {
                    let members = &self.members[self.class_of[a]];
                    if members.len() < 2 {
                        continue;
                    }
                    // skip `a` itself inside its class
                    let pos = rng.gen_range(0..members.len() - 1);
                    let b = members[pos];
                    if b == a {
                        members[members.len() - 1]
                    } else {
                        b
                    }
                } else {
                    match self.other(a, rng) {
                        Some(b) => b,
                        None => continue,
                    }
                };

                if seen.insert((a, b)) {
                    pairs.push((a, b));
                }
            }
        }

        pairs
    }
}

fn pairs_to_array(pairs: &[(usize, usize)]) -> Array2<usize> {
    Array2::from_shape_fn((pairs.len(), 2), |(i, j)| if j == 0 { pairs[i].0 } else { pairs[i].1 })
}

/// Sample up to `num` distinct similar pairs and up to `num` distinct dissimilar pairs
///
/// A similar pair joins two different records of the same class, a dissimilar pair records of
/// different classes. If not enough distinct pairs exist, fewer are returned and a warning is
/// logged.
pub fn positive_negative_pairs<L: Label, R: Rng>(
    labels: ArrayView1<L>,
    num: usize,
    rng: &mut R,
) -> Result<Pairs> {
    let classes = Classes::new(labels)?;

    let similar = classes.distinct_pairs(num, true, rng);
    let dissimilar = classes.distinct_pairs(num, false, rng);
    if similar.len() < num || dissimilar.len() < num {
        log::warn!(
            "only generated {} similar and {} dissimilar pairs, requested {}",
            similar.len(),
            dissimilar.len(),
            num
        );
    }

    Pairs::new(pairs_to_array(&similar), pairs_to_array(&dissimilar))
}

/// Sample `num` relative comparisons `(a, b, c, d)`
///
/// `a` and `c` are drawn uniformly, `b` shares the class of `a` and `d` belongs to a different
/// class than `c`.
pub fn quadruplets<L: Label, R: Rng>(
    labels: ArrayView1<L>,
    num: usize,
    rng: &mut R,
) -> Result<Quadruplets> {
    let classes = Classes::new(labels)?;

    let mut indices = Array2::zeros((num, 4));
    for mut row in indices.rows_mut() {
        let a = rng.gen_range(0..classes.len());
        let c = rng.gen_range(0..classes.len());
        row[0] = a;
        row[1] = classes.same(a, rng);
        row[2] = c;
        row[3] = classes
            .other(c, rng)
            .ok_or_else(|| Error::Parameters("at least two classes are needed".into()))?;
    }

    Quadruplets::new(indices)
}

/// Sample a signed similarity graph from `num` relative comparisons
///
/// Every comparison `(a, b, c, d)` sets the symmetric weights `w_ab = 1` and `w_cd = -1`.
pub fn adjacency_matrix<F: Float, L: Label, R: Rng>(
    labels: ArrayView1<L>,
    num: usize,
    rng: &mut R,
) -> Result<Array2<F>> {
    let n = labels.len();
    let quads = quadruplets(labels, num, rng)?;

    let mut graph = Array2::zeros((n, n));
    for row in quads.indices().rows() {
        graph[(row[0], row[1])] = F::one();
        graph[(row[1], row[0])] = F::one();
        graph[(row[2], row[3])] = -F::one();
        graph[(row[3], row[2])] = -F::one();
    }

    Ok(graph)
}

/// Group records into `num_chunks` disjoint chunklets of `chunk_size` records of the same class
///
/// Records which are not drawn stay unassigned. Fails if the classes are too small to provide
/// the requested chunklets.
pub fn chunklets<L: Label, R: Rng>(
    labels: ArrayView1<L>,
    num_chunks: usize,
    chunk_size: usize,
    rng: &mut R,
) -> Result<Chunklets> {
    if chunk_size == 0 {
        return Err(Error::Parameters("chunklets need at least one record".into()));
    }

    let classes = Classes::new(labels)?;
    let mut available = classes.members;
    let mut ids = Array1::from_elem(classes.class_of.len(), None);

    let mut chunk = 0;
    while chunk < num_chunks && !available.is_empty() {
        let class = rng.gen_range(0..available.len());
        if available[class].len() < chunk_size {
            available.swap_remove(class);
            continue;
        }

        let mut picked = index::sample(rng, available[class].len(), chunk_size).into_vec();
        picked.sort_unstable_by(|a, b| b.cmp(a));
        for pos in picked {
            let idx = available[class].swap_remove(pos);
            ids[idx] = Some(chunk);
        }
        chunk += 1;
    }

    if chunk < num_chunks {
        return Err(Error::Parameters(format!(
            "unable to make {} chunklets of {} records each",
            num_chunks, chunk_size
        )));
    }

    Ok(Chunklets::new(ids))
}

/// Shuffle helper used by the examples and benches to subsample a dataset
pub fn shuffled_indices<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut indices = (0..n).collect::<Vec<_>>();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn labels() -> Array1<usize> {
        array![0usize, 0, 0, 0, 1, 1, 1, 2, 2, 2]
    }

    #[test]
    fn pairs_respect_classes() {
        let labels = labels();
        let mut rng = SmallRng::seed_from_u64(42);
        let pairs = positive_negative_pairs(labels.view(), 8, &mut rng).unwrap();

        assert_eq!(pairs.similar().nrows(), 8);
        assert_eq!(pairs.dissimilar().nrows(), 8);
        for row in pairs.similar().rows() {
            assert_ne!(row[0], row[1]);
            assert_eq!(labels[row[0]], labels[row[1]]);
        }
        for row in pairs.dissimilar().rows() {
            assert_ne!(labels[row[0]], labels[row[1]]);
        }
    }

    #[test]
    fn pairs_are_distinct() {
        // only 2 ordered similar pairs exist
        let labels = array![0usize, 0, 1];
        let mut rng = SmallRng::seed_from_u64(1);
        let pairs = positive_negative_pairs(labels.view(), 10, &mut rng).unwrap();

        assert!(pairs.similar().nrows() <= 2);
        assert!(pairs.dissimilar().nrows() <= 4);
    }

    #[test]
    fn quadruplets_respect_classes() {
        let labels = labels();
        let mut rng = SmallRng::seed_from_u64(42);
        let quads = quadruplets(labels.view(), 50, &mut rng).unwrap();

        assert_eq!(quads.len(), 50);
        for row in quads.indices().rows() {
            assert_eq!(labels[row[0]], labels[row[1]]);
            assert_ne!(labels[row[2]], labels[row[3]]);
        }

        let single = array![1usize, 1, 1];
        assert!(quadruplets(single.view(), 5, &mut rng).is_err());
    }

    #[test]
    fn adjacency_is_symmetric_and_signed() {
        let labels = labels();
        let mut rng = SmallRng::seed_from_u64(3);
        let graph: Array2<f64> = adjacency_matrix(labels.view(), 30, &mut rng).unwrap();

        assert_eq!(graph, graph.t());
        for ((i, j), w) in graph.indexed_iter() {
            if *w > 0. {
                assert_eq!(labels[i], labels[j]);
            } else if *w < 0. {
                assert_ne!(labels[i], labels[j]);
            }
        }
    }

    #[test]
    fn chunklets_are_pure() {
        let labels = labels();
        let mut rng = SmallRng::seed_from_u64(7);
        let chunks = chunklets(labels.view(), 4, 2, &mut rng).unwrap();

        let groups = chunks.groups();
        assert_eq!(groups.len(), 4);
        for group in groups {
            assert_eq!(group.len(), 2);
            assert_eq!(labels[group[0]], labels[group[1]]);
        }

        assert!(chunklets(labels.view(), 6, 3, &mut rng).is_err());
    }

    #[test]
    fn shuffle_is_permutation() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut indices = shuffled_indices(20, &mut rng);
        indices.sort_unstable();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }
}
