use super::{DatasetBase, DatasetView, Float, Records};
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};

impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dataset = Dataset::new(records, targets);
    /// ```
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// This allow the reader to understand its purpose while analysing results, for example
    /// correlation analysis or feature importance.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the records of a dataset
    pub fn with_records<T2: Records>(self, records: T2) -> DatasetBase<T2, T> {
        DatasetBase {
            records,
            targets: self.targets,
            feature_names: Vec::new(),
        }
    }

    /// Replace the targets of a dataset, for example labels by constraints sampled from them
    pub fn with_targets<T2>(self, targets: T2) -> DatasetBase<R, T2> {
        DatasetBase {
            records: self.records,
            targets,
            feature_names: self.feature_names,
        }
    }

    /// Sets the feature names
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }
}

impl<F, L, D, S> DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>
where
    D: Data<Elem = F>,
    S: Data<Elem = L>,
{
    /// Map labels with a function `f`
    pub fn map_targets<L2, G: FnMut(&L) -> L2>(self, fnc: G) -> DatasetBase<ArrayBase<D, Ix2>, Array1<L2>> {
        let DatasetBase {
            records,
            targets,
            feature_names,
        } = self;

        DatasetBase {
            records,
            targets: targets.map(fnc),
            feature_names,
        }
    }

    /// Creates a view of a dataset
    pub fn view(&self) -> DatasetView<'_, F, L> {
        DatasetBase {
            records: self.records.view(),
            targets: self.targets.view(),
            feature_names: self.feature_names.clone(),
        }
    }
}

impl<F: Float, D: Data<Elem = F>> From<ArrayBase<D, Ix2>> for DatasetBase<ArrayBase<D, Ix2>, ()> {
    fn from(records: ArrayBase<D, Ix2>) -> Self {
        DatasetBase::new(records, ())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Dataset;
    use ndarray::{array, Array2};

    #[test]
    fn replace_targets_keeps_names() {
        let dataset = Dataset::new(array![[1., 2.], [3., 4.]], array![0usize, 1])
            .with_feature_names(vec!["a", "b"]);

        let relabeled = dataset.map_targets(|x| *x == 1);
        assert_eq!(relabeled.targets(), &array![false, true]);

        let constrained = relabeled.with_targets(vec![(0usize, 1usize)]);
        assert_eq!(constrained.feature_names(), vec!["a", "b"]);
        assert_eq!(constrained.targets(), &vec![(0, 1)]);
    }

    #[test]
    fn default_feature_names() {
        let dataset = Dataset::new(Array2::<f64>::zeros((2, 3)), array![0usize, 0]);
        assert_eq!(
            dataset.feature_names(),
            vec!["feature-0", "feature-1", "feature-2"]
        );
        assert_eq!(dataset.view().records().dim(), (2, 3));
    }
}
