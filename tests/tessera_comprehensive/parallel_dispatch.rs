//! Parallel Dispatch Tests
//!
//! Cancellation safety of the chunked dispatch and equivalence of parallel
//! and sequential filter runs.

use crate::test_utils::*;
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

const TUPLES: usize = 10_000;
const CHUNKS: usize = 10;

/// Chunks of `data` that were written, checking none is partially written
fn written_chunks(data: &[u32], chunks: &[Range<usize>]) -> usize {
    chunks
        .iter()
        .filter(|chunk| {
            let written = data[(*chunk).clone()].iter().filter(|v| **v != 0).count();
            assert!(written == 0 || written == chunk.len(), "chunk {:?} partially written", chunk);
            written == chunk.len()
        })
        .count()
}

// =============================================================================
// Cancellation Safety
// =============================================================================

#[test]
fn test_parallel_cancel_mid_run_writes_only_started_chunks() {
    init_tracing();
    let algo = ParallelDataAlgorithm::new(0..TUPLES).with_chunk_count(CHUNKS);
    let chunks = algo.chunks();
    assert_eq!(chunks.len(), CHUNKS);

    let mut data = vec![0u32; TUPLES];
    let cancel = CancelFlag::new();
    let invoked = AtomicUsize::new(0);
    let outcome = algo
        .execute_mut(
            &mut data,
            1,
            |range, slice, cancel| {
                for (value, index) in slice.iter_mut().zip(range.clone()) {
                    *value = index as u32 + 1;
                }
                if invoked.fetch_add(1, Ordering::SeqCst) == 2 {
                    cancel.cancel();
                }
            },
            &cancel,
        )
        .unwrap();

    assert!(outcome.is_cancelled());
    let started = outcome.chunks_started();
    assert_eq!(started, invoked.load(Ordering::SeqCst));
    assert!(started >= 3 && started <= CHUNKS);
    assert_eq!(written_chunks(&data, &chunks), started);
}

#[test]
fn test_sequential_cancel_stops_at_exact_chunk() {
    let algo = ParallelDataAlgorithm::new(0..TUPLES)
        .with_config(ParallelConfig::sequential())
        .with_chunk_count(CHUNKS);
    let chunks = algo.chunks();

    let mut data = vec![0u32; TUPLES];
    let cancel = CancelFlag::new();
    let outcome = algo
        .execute_mut(
            &mut data,
            1,
            |range, slice, cancel| {
                slice.fill(7);
                if range.start >= TUPLES / 2 {
                    cancel.cancel();
                }
            },
            &cancel,
        )
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Cancelled {
            chunks_started: 6,
            chunks_total: CHUNKS
        }
    );
    assert_eq!(written_chunks(&data, &chunks), 6);
    assert!(data[TUPLES * 6 / CHUNKS..].iter().all(|v| *v == 0));
}

#[test]
fn test_cancelled_flag_skips_every_chunk() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let calls = AtomicUsize::new(0);
    let outcome = ParallelDataAlgorithm::new(0..TUPLES).with_chunk_count(CHUNKS).execute(
        |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        },
        &cancel,
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.chunks_started(), 0);
    assert!(outcome.is_cancelled());
}

#[test]
fn test_chunks_cover_range_once() {
    let seen = Mutex::new(vec![0u8; 1234]);
    let outcome = ParallelDataAlgorithm::new(0..1234)
        .with_grain_size(17)
        .execute(
            |range, _| {
                let mut seen = seen.lock();
                for i in range {
                    seen[i] += 1;
                }
            },
            &CancelFlag::new(),
        );
    assert!(outcome.is_completed());
    assert!(seen.lock().iter().all(|count| *count == 1));
}

// =============================================================================
// Parallel / Sequential Equivalence
// =============================================================================

struct StatisticsRun {
    min: Vec<f64>,
    mean: Vec<f64>,
    chunks: usize,
}

fn statistics_with(runner: FilterRunner, tuples: usize) -> StatisticsRun {
    let (ids, values) = generated_cells(tuples, 6);
    let mut ds = feature_graph(ids, values);
    let messages = MessageCollector::new();
    let report = runner.run(
        &FindFeatureStatisticsFilter,
        &mut ds,
        &statistics_args(6),
        &messages,
        &CancelFlag::new(),
    );
    assert!(report.is_completed(), "{:?}", report.error);
    let chunks = messages
        .of_kind(MessageKind::Debug)
        .iter()
        .find_map(|m| {
            let rest = m.text.strip_prefix(&format!("{} tuples in ", tuples))?;
            rest.strip_suffix(" chunks")?.parse().ok()
        })
        .expect("chunk count reported");
    let min = ds.get_array::<f64>(&path("Feature Data/Minimum")).unwrap();
    let mean = ds.get_array::<f64>(&path("Feature Data/Mean")).unwrap();
    StatisticsRun {
        min: min.as_slice().to_vec(),
        mean: mean.as_slice().to_vec(),
        chunks,
    }
}

#[test]
fn test_parallel_and_sequential_statistics_agree() {
    init_tracing();
    let sequential = EngineConfig {
        parallel: ParallelConfig::sequential(),
        ..EngineConfig::default()
    };
    let parallel = EngineConfig {
        parallel: ParallelConfig {
            max_threads: Some(4),
            min_grain_size: 1,
            ..ParallelConfig::default()
        },
        ..EngineConfig::default()
    };

    let seq = statistics_with(sequential.runner(), 1_000);
    let par = statistics_with(parallel.runner(), 1_000);
    assert!(par.chunks > 1, "parallel run used {} chunk", par.chunks);
    assert_eq!(seq.min, par.min);
    assert_eq!(seq.mean, par.mean);

    // Background row stays zero, every other feature is populated
    assert_eq!(seq.min[0], 0.0);
    assert_eq!(seq.mean[0], 0.0);
    assert!(seq.min[1..].iter().all(|m| *m < 0.0));
}

#[test]
fn test_configured_grain_reaches_kernels() {
    let with_grain = |min_grain_size: usize| EngineConfig {
        parallel: ParallelConfig {
            max_threads: Some(2),
            min_grain_size,
            ..ParallelConfig::default()
        },
        ..EngineConfig::default()
    };
    let coarse = statistics_with(with_grain(1_000).runner(), 1_000);
    let fine = statistics_with(with_grain(100).runner(), 1_000);
    assert_eq!(coarse.chunks, 1);
    assert_eq!(fine.chunks, 8);
    assert_eq!(coarse.mean, fine.mean);
}

#[test]
fn test_statistics_match_direct_computation() {
    let (ids, values) = generated_cells(1_000, 6);
    let StatisticsRun { min, mean, .. } = statistics_with(FilterRunner::new(), 1_000);
    for feature in 1..6 {
        let members: Vec<f64> = ids
            .iter()
            .zip(&values)
            .filter(|(id, _)| **id == feature as i32)
            .map(|(_, v)| *v as f64)
            .collect();
        let expected_min = members.iter().cloned().fold(f64::INFINITY, f64::min);
        let expected_mean = members.iter().sum::<f64>() / members.len() as f64;
        assert_eq!(min[feature], expected_min);
        assert!((mean[feature] - expected_mean).abs() < 1e-9);
    }
}

#[test]
fn test_parallel_and_sequential_conversion_agree() {
    let run = |config: EngineConfig| {
        let (_, values) = generated_cells(TUPLES, 6);
        let mut ds = feature_graph(vec![0; TUPLES], values);
        let args = ConvertDataTypeFilter
            .parameters()
            .default_arguments()
            .with("input_path", "Cells/Values")
            .with("output_type", DataType::Int16);
        let report = config
            .runner()
            .run(&ConvertDataTypeFilter, &mut ds, &args, &NullMessageHandler, &CancelFlag::new());
        assert!(report.is_completed());
        ds.get_array::<i16>(&path("Cells/Converted"))
            .unwrap()
            .as_slice()
            .to_vec()
    };
    let sequential = run(EngineConfig {
        parallel: ParallelConfig::sequential(),
        ..EngineConfig::default()
    });
    let parallel = run(EngineConfig::default());
    assert_eq!(sequential, parallel);
    assert_eq!(sequential.len(), TUPLES);
}
