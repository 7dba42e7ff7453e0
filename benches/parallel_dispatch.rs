//! Parallel Dispatch Benchmarks
//!
//! ## Benchmark Path Types (Layer Labels)
//!
//! - `dispatch_*`: the bare chunked dispatch, no data graph involved
//! - `filter_*`: a full filter run through the driver (preflight, apply, execute)
//!
//! Every parallel benchmark has a `sequential` twin with identical input, so
//! the ratio between the two is the speedup the worker pool buys.
//!
//! ## What These Benchmarks Prove
//!
//! | Benchmark | Semantic Guarantee | Regression Detection |
//! |-----------|-------------------|----------------------|
//! | dispatch_execute_mut/* | Disjoint slices, every chunk runs once | Splitting/scheduling overhead |
//! | dispatch_grain/* | Chunking follows the grain size | Too many or too few chunks |
//! | filter_convert/* | Saturating conversion of a whole array | Per-element dispatch cost |
//! | filter_statistics/* | Per-feature min/mean, background excluded | Bucketing and reduction cost |
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench parallel_dispatch
//! cargo bench --bench parallel_dispatch -- "filter_statistics"  # specific group
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use tessera::{
    Arguments, CancelFlag, ConvertDataTypeFilter, DataPath, DataStore, DataStructure, DataType,
    EngineConfig, Filter, FilterRunner, FindFeatureStatisticsFilter, NullMessageHandler,
    ParallelConfig, ParallelDataAlgorithm,
};

// =============================================================================
// Constants and Configuration
// =============================================================================

const SIZES: [usize; 3] = [10_000, 100_000, 1_000_000];
const FEATURES: usize = 64;

// =============================================================================
// Utilities - All allocation happens here, outside timed loops
// =============================================================================

fn modes() -> [(&'static str, ParallelConfig); 2] {
    [
        ("sequential", ParallelConfig::sequential()),
        ("parallel", ParallelConfig::default()),
    ]
}

fn runner(parallel: ParallelConfig) -> FilterRunner {
    EngineConfig {
        parallel,
        ..EngineConfig::default()
    }
    .runner()
}

fn cells(tuples: usize) -> DataStructure {
    let ids: Vec<i32> = (0..tuples).map(|i| ((i * 31) % FEATURES) as i32).collect();
    let values: Vec<f32> = (0..tuples).map(|i| (i % 977) as f32 * 0.5).collect();
    let mut ds = DataStructure::new();
    let root = DataPath::root();
    ds.create_attribute_matrix("Cells", &root, vec![tuples]).unwrap();
    let cells: DataPath = "Cells".parse().unwrap();
    let ids = DataStore::from_vec(vec![tuples], vec![1], ids).unwrap();
    ds.create_data_array_with(&cells, "FeatureIds", ids.into()).unwrap();
    let values = DataStore::from_vec(vec![tuples], vec![1], values).unwrap();
    ds.create_data_array_with(&cells, "Values", values.into()).unwrap();
    ds
}

fn statistics_args() -> Arguments {
    FindFeatureStatisticsFilter
        .parameters()
        .default_arguments()
        .with("feature_ids_path", "Cells/FeatureIds")
        .with("input_path", "Cells/Values")
        .with("number_of_features", FEATURES as i64)
}

fn convert_args() -> Arguments {
    ConvertDataTypeFilter
        .parameters()
        .default_arguments()
        .with("input_path", "Cells/Values")
        .with("output_type", DataType::Int32)
}

// =============================================================================
// Dispatch Benchmarks
// =============================================================================

fn dispatch_execute_mut_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_execute_mut");
    let cancel = CancelFlag::new();

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        for (label, config) in modes() {
            let mut data = vec![0.0f64; size];
            let algo = ParallelDataAlgorithm::new(0..size).with_config(config);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    let outcome = algo.execute_mut(
                        &mut data,
                        1,
                        |range, chunk, _| {
                            for (value, index) in chunk.iter_mut().zip(range) {
                                *value = (index as f64).sqrt();
                            }
                        },
                        &cancel,
                    );
                    black_box(outcome)
                });
            });
        }
    }
    group.finish();
}

fn dispatch_grain_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_grain");
    let cancel = CancelFlag::new();
    let size = 1_000_000;
    group.throughput(Throughput::Elements(size as u64));

    for grain in [64, 1_024, 16_384, 262_144] {
        let algo = ParallelDataAlgorithm::new(0..size).with_grain_size(grain);
        group.bench_with_input(BenchmarkId::from_parameter(grain), &grain, |b, _| {
            b.iter(|| {
                black_box(algo.execute(
                    |range, _| {
                        black_box(range.map(|i| i as u64).sum::<u64>());
                    },
                    &cancel,
                ))
            });
        });
    }
    group.finish();
}

// =============================================================================
// Filter Benchmarks
// =============================================================================

fn filter_convert_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_convert");
    let args = convert_args();
    let cancel = CancelFlag::new();

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let source = cells(size);
        for (label, config) in modes() {
            let runner = runner(config);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter_batched(
                    || source.clone(),
                    |mut ds| {
                        let report =
                            runner.run(&ConvertDataTypeFilter, &mut ds, &args, &NullMessageHandler, &cancel);
                        black_box(report.state)
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn filter_statistics_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_statistics");
    let args = statistics_args();
    let cancel = CancelFlag::new();

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let source = cells(size);
        for (label, config) in modes() {
            let runner = runner(config);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter_batched(
                    || source.clone(),
                    |mut ds| {
                        let report = runner.run(
                            &FindFeatureStatisticsFilter,
                            &mut ds,
                            &args,
                            &NullMessageHandler,
                            &cancel,
                        );
                        black_box(report.state)
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

// =============================================================================
// Benchmark Groups
// =============================================================================

criterion_group!(
    name = dispatch;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = dispatch_execute_mut_benchmarks, dispatch_grain_benchmarks
);

criterion_group!(
    name = filters;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(20);
    targets = filter_convert_benchmarks, filter_statistics_benchmarks
);

criterion_main!(dispatch, filters);
