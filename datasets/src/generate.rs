//! Utility functions for randomly generating labeled datasets

use metric_learn::Dataset;
use ndarray::{s, Array, Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Distribution, StandardNormal},
    RandomExt,
};

/// Special case of `labeled_blobs_with_distribution` with a standard normal distribution
pub fn labeled_blobs(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Dataset<f64, usize> {
    labeled_blobs_with_distribution(blob_size, blob_centroids, StandardNormal, rng)
}

/// Given an input matrix `blob_centroids`, with shape `(n_blobs, n_features)`, generate
/// `blob_size` records around each of the centroids.
///
/// The records of the `k`-th blob are labeled with class `k`. Together with a distribution
/// which stretches some features this gives datasets where the Euclidean distance is a poor
/// choice and a learned metric should help.
pub fn labeled_blobs_with_distribution(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    distribution: impl Distribution<f64> + Clone,
    rng: &mut impl Rng,
) -> Dataset<f64, usize> {
    let (n_centroids, n_features) = blob_centroids.dim();
    let mut records: Array2<f64> = Array2::zeros((n_centroids * blob_size, n_features));
    let mut targets = Array1::zeros(n_centroids * blob_size);

    for (blob_index, blob_centroid) in blob_centroids.rows().into_iter().enumerate() {
        let noise: Array2<f64> =
            Array::random_using((blob_size, n_features), distribution.clone(), rng);

        let rows = blob_index * blob_size..(blob_index + 1) * blob_size;
        records
            .slice_mut(s![rows.clone(), ..])
            .assign(&(noise + &blob_centroid));
        targets.slice_mut(s![rows]).fill(blob_index);
    }

    Dataset::new(records, targets)
}

/// Scale every feature of the records by the given factor
///
/// Useful to hide the class structure of a dataset behind a badly scaled noise feature.
pub fn stretch_features(
    dataset: Dataset<f64, usize>,
    factors: &ArrayBase<impl Data<Elem = f64>, ndarray::Ix1>,
) -> Dataset<f64, usize> {
    let records = &dataset.records * factors;
    dataset.with_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn blobs_are_labeled_by_centroid() {
        let mut rng = SmallRng::seed_from_u64(42);
        let centroids = array![[0., 0.], [50., 50.]];
        let ds = labeled_blobs(100, &centroids, &mut rng);

        assert_eq!(ds.records().dim(), (200, 2));
        for (record, class) in ds.records().rows().into_iter().zip(ds.targets().iter()) {
            let centroid = centroids.row(*class);
            let dist = (&record - &centroid).mapv(|x| x * x).sum().sqrt();
            assert!(dist < 10.);
        }
    }

    #[test]
    fn stretching_scales_columns() {
        let mut rng = SmallRng::seed_from_u64(3);
        let ds = labeled_blobs(5, &array![[1., 1.]], &mut rng);
        let before = ds.records().clone();

        let ds = stretch_features(ds, &array![1., 10.]);
        assert_abs_diff_eq!(ds.records().column(0), before.column(0));
        assert_abs_diff_eq!(ds.records().column(1), &before.column(1) * 10.);
    }
}
