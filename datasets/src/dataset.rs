use std::io::Read;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use ndarray::{s, Array1, Array2};
use ndarray_csv::{Array2Reader, ReadError};

/// Table of numeric features with a class id in its last column
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub feature_names: Vec<String>,
    pub records: Array2<f64>,
    pub labels: Array1<usize>,
}

/// Read a gzipped CSV file with header into a [`LabeledTable`]
pub fn labeled_table_from_gz_csv<R: Read>(
    gz: R,
    separator: u8,
) -> Result<LabeledTable, ReadError> {
    labeled_table_from_csv(GzDecoder::new(gz), separator)
}

/// Read a CSV file with header into a [`LabeledTable`]
///
/// All columns but the last are features named after their header field. The last column
/// holds non-negative integral class ids.
pub fn labeled_table_from_csv<R: Read>(
    csv: R,
    separator: u8,
) -> Result<LabeledTable, ReadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(separator)
        .from_reader(csv);

    let header = reader.headers().map_err(ReadError::Csv)?.clone();
    let table: Array2<f64> = reader.deserialize_array2_dynamic()?;
    let n_features = table.ncols().saturating_sub(1);

    let feature_names = header
        .iter()
        .take(n_features)
        .map(|name| name.trim().to_string())
        .collect();
    let labels = table.column(n_features).mapv(|class| class.max(0.).round() as usize);

    Ok(LabeledTable {
        feature_names,
        records: table.slice(s![.., ..n_features]).to_owned(),
        labels,
    })
}
