use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use metric_learn::benchmarks::config;
use metric_learn::prelude::*;
use metric_learn::sampling;
use metric_learn_weakly::{Itml, Lsml, Rca, Sdml, WeaklySupervisedError};
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn weakly_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let iris = metric_learn_datasets::iris();

    // records drawn from iris
    let sizes = &[50, 100, 150];

    let mut group = c.benchmark_group("weakly");
    config::set_default_benchmark_configs(&mut group);

    for n in sizes.iter() {
        let mut indices = sampling::shuffled_indices(iris.records().nrows(), &mut rng);
        indices.truncate(*n);
        let records = iris.records().select(Axis(0), &indices);
        let labels = iris.targets().select(Axis(0), &indices);

        let quadruplets = sampling::quadruplets(labels.view(), 200, &mut rng).unwrap();
        let dataset = DatasetBase::new(records.clone(), quadruplets);
        let lsml = Lsml::params();
        group.bench_with_input(BenchmarkId::new("lsml", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, WeaklySupervisedError> { lsml.fit(d) })
        });

        let pairs = sampling::positive_negative_pairs(labels.view(), 200, &mut rng).unwrap();
        let dataset = DatasetBase::new(records.clone(), pairs);
        let itml = Itml::params();
        group.bench_with_input(BenchmarkId::new("itml", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, WeaklySupervisedError> { itml.fit(d) })
        });

        let graph: Array2<f64> =
            sampling::adjacency_matrix(labels.view(), 10 * n, &mut rng).unwrap();
        let dataset = DatasetBase::new(records.clone(), graph);
        let sdml = Sdml::params();
        group.bench_with_input(BenchmarkId::new("sdml", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, WeaklySupervisedError> { sdml.fit(d) })
        });

        let chunklets = sampling::chunklets(labels.view(), n / 5, 2, &mut rng).unwrap();
        let dataset = DatasetBase::new(records, chunklets);
        let rca = Rca::params().n_components(2);
        group.bench_with_input(BenchmarkId::new("rca", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, WeaklySupervisedError> { rca.fit(d) })
        });
    }

    group.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = config::get_default_profiling_configs();
    targets = weakly_bench
}
#[cfg(target_os = "windows")]
criterion_group!(benches, weakly_bench);

criterion_main!(benches);
