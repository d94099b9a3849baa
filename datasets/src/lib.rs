//! `metric-learn-datasets` provides small datasets ready to be used in tests, benches and
//! examples of the metric learners.
//!
//! ## Current State
//!
//! Currently the following datasets are provided:
//!
//! * `["iris"]` : iris flower dataset, 150 records of three classes with four features
//! * `["generate"]` : labeled Gaussian blobs around given centroids
//!
//! ## Using a dataset
//!
//! Add the crate to your Cargo.toml with the corresponding feature enabled:
//! ```ignore
//! metric-learn-datasets = { version = "0.1.0", features = ["iris"] }
//! ```
//! and then use it in your tests as
//! ```ignore
//! let iris = metric_learn_datasets::iris();
//! ```

mod dataset;
#[cfg(feature = "generate")]
pub mod generate;

pub use dataset::{labeled_table_from_csv, labeled_table_from_gz_csv, LabeledTable};

#[cfg(feature = "iris")]
use metric_learn::Dataset;

#[cfg(feature = "iris")]
/// Read in the iris-flower dataset
///
/// The records hold sepal and petal measurements in centimeters, the targets are the class ids
/// `0` (setosa), `1` (versicolor) and `2` (virginica).
pub fn iris() -> Dataset<f64, usize> {
    let data = include_bytes!("../data/iris.csv.gz");
    // the embedded file is known to be well formed
    let table = labeled_table_from_gz_csv(&data[..], b',').unwrap();

    Dataset::new(table.records, table.labels).with_feature_names(table.feature_names)
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "iris")]
    #[test]
    fn test_iris() {
        let ds = super::iris();

        assert_eq!(ds.records().dim(), (150, 4));
        assert_eq!(
            ds.feature_names(),
            vec!["sepal_length", "sepal_width", "petal_length", "petal_width"]
        );

        let mut counts = [0; 3];
        for class in ds.targets().iter() {
            counts[*class] += 1;
        }
        assert_eq!(counts, [50, 50, 50]);

        // first and last record
        assert_eq!(ds.records().row(0).to_vec(), vec![5.1, 3.5, 1.4, 0.2]);
        assert_eq!(ds.records().row(149).to_vec(), vec![5.9, 3.0, 5.1, 1.8]);
    }
}
