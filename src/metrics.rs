//! Evaluation of learned metrics
use ndarray::{ArrayBase, ArrayView1, Data, Ix2};

use crate::dataset::{label_groups, Label};
use crate::error::{Error, Result};
use crate::linalg::pairwise_distances;
use crate::Float;

/// Ratio of intra-class to inter-class spread, lower is better separated
///
/// For every class the mean Euclidean distance between its members (self pairs included) is
/// divided by the mean distance from its members to all other records. The ratios are
/// averaged over the classes.
///
/// Fails if the number of labels does not match the records or if there is a single class.
pub fn class_separation<F: Float, D: Data<Elem = F>, L: Label>(
    x: &ArrayBase<D, Ix2>,
    labels: ArrayView1<L>,
) -> Result<F> {
    if x.nrows() != labels.len() {
        return Err(Error::InputShape(format!(
            "{} records with {} labels",
            x.nrows(),
            labels.len()
        )));
    }

    let groups = label_groups(labels);
    if groups.len() < 2 {
        return Err(Error::Parameters(
            "class separation needs at least two classes".into(),
        ));
    }

    let mut ratio = F::zero();
    for (_, members) in &groups {
        let inside = x.select(ndarray::Axis(0), members);
        let outside_idx = (0..x.nrows())
            .filter(|idx| members.binary_search(idx).is_err())
            .collect::<Vec<_>>();
        let outside = x.select(ndarray::Axis(0), &outside_idx);

        let intra = pairwise_distances(&inside, &inside).mean().unwrap_or_else(F::zero);
        let inter = pairwise_distances(&inside, &outside).mean().unwrap_or_else(F::zero);
        ratio += intra / inter;
    }

    Ok(ratio / F::cast(groups.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn separation_of_two_clusters() {
        let x = array![[0., 0.], [0., 1.], [10., 0.], [10., 1.]];
        let labels = array![0usize, 0, 1, 1];

        // intra: (0 + 1 + 1 + 0) / 4, inter: (10 + √101 + √101 + 10) / 4
        let expected = 0.5 / ((20. + 2. * 101f64.sqrt()) / 4.);
        assert_abs_diff_eq!(
            class_separation(&x, labels.view()).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn scaling_does_not_change_separation() {
        let x = array![[0., 0.], [0., 1.], [3., 0.], [4., 1.], [1., 5.]];
        let labels = array!["a", "a", "b", "b", "c"];

        let base = class_separation(&x, labels.view()).unwrap();
        let scaled = class_separation(&(&x * 3.), labels.view()).unwrap();
        assert_abs_diff_eq!(base, scaled, epsilon = 1e-12);
    }

    #[test]
    fn iris_classes_are_separated() {
        let iris = metric_learn_datasets::iris();
        let ratio = class_separation(iris.records(), iris.targets().view()).unwrap();

        assert!(ratio > 0.25 && ratio < 0.35);
    }

    #[test]
    fn random_labels_are_not_separated() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1234);
        let x = Array2::random_using((300, 4), Uniform::new(0., 1.), &mut rng);
        let labels = Array1::from_shape_fn(300, |idx| idx % 3);

        let ratio = class_separation(&x, labels.view()).unwrap();
        assert!(ratio > 0.9 && ratio < 1.05);
    }

    #[test]
    fn invalid_inputs() {
        let x = array![[0., 0.], [1., 1.]];
        assert!(class_separation(&x, array![0usize, 0].view()).is_err());
        assert!(class_separation(&x, array![0usize, 1, 1].view()).is_err());
    }
}
