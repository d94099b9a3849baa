use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use metric_learn::benchmarks::config;
use metric_learn::prelude::*;
use metric_learn_datasets::generate::labeled_blobs;
use metric_learn_supervised::{Lfda, Lmnn, LmnnImpl, Nca, SupervisedError};
use ndarray::array;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn supervised_bench(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let centroids = array![[0., 0., 0., 0.], [4., 4., 0., 0.], [0., 4., 4., 0.]];

    // records per class
    let sizes = &[20, 50, 100];

    let mut group = c.benchmark_group("supervised");
    config::set_default_benchmark_configs(&mut group);

    for n in sizes.iter() {
        let dataset = labeled_blobs(*n, &centroids, &mut rng);

        for implementation in [LmnnImpl::Reference, LmnnImpl::Accelerated].iter() {
            let params = Lmnn::params()
                .k(3)
                .learning_rate(1e-5)
                .max_iter(100)
                .implementation(*implementation);
            group.bench_with_input(
                BenchmarkId::new(format!("lmnn-{:?}", implementation), n),
                &dataset,
                |b, d| b.iter(|| -> std::result::Result<_, SupervisedError> { params.fit(d) }),
            );
        }

        let nca = Nca::params().max_iter(20);
        group.bench_with_input(BenchmarkId::new("nca", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, SupervisedError> { nca.fit(d) })
        });

        let lfda = Lfda::params().n_components(2);
        group.bench_with_input(BenchmarkId::new("lfda", n), &dataset, |b, d| {
            b.iter(|| -> std::result::Result<_, SupervisedError> { lfda.fit(d) })
        });
    }

    group.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = config::get_default_profiling_configs();
    targets = supervised_bench
}
#[cfg(target_os = "windows")]
criterion_group!(benches, supervised_bench);

criterion_main!(benches);
