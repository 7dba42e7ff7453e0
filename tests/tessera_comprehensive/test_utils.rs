//! Shared helpers for the comprehensive suite

#![allow(dead_code)]

use std::sync::Once;
pub use tessera::*;

static TRACING: Once = Once::new();

/// Route engine logs to the test writer, once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn path(s: &str) -> DataPath {
    s.parse().unwrap()
}

/// Structure of a graph without buffer contents: every path with its type
/// and, for arrays, element kind and shapes
pub fn signature(ds: &DataStructure) -> Vec<(String, DataObjectType, Option<(DataType, Vec<usize>, Vec<usize>)>)> {
    let mut out: Vec<_> = ds
        .get_all_paths()
        .into_iter()
        .map(|p| {
            let object = ds.get_by_path(&p).unwrap();
            let store = object.store().map(|s| {
                (
                    s.data_type(),
                    s.tuple_shape().to_vec(),
                    s.component_shape().to_vec(),
                )
            });
            (p.to_path_string(), object.object_type(), store)
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Attribute matrix `Cells` with `FeatureIds` (int32) and `Values` (float32)
pub fn feature_graph(ids: Vec<i32>, values: Vec<f32>) -> DataStructure {
    let n = ids.len();
    let mut ds = DataStructure::new();
    ds.create_attribute_matrix("Cells", &DataPath::root(), vec![n])
        .unwrap();
    let ids = DataStore::from_vec(vec![n], vec![1], ids).unwrap();
    ds.create_data_array_with(&path("Cells"), "FeatureIds", ids)
        .unwrap();
    let values = DataStore::from_vec(vec![n], vec![1], values).unwrap();
    ds.create_data_array_with(&path("Cells"), "Values", values)
        .unwrap();
    ds
}

/// Deterministic ids in `0..features` and values for `tuples` cells
pub fn generated_cells(tuples: usize, features: i32) -> (Vec<i32>, Vec<f32>) {
    let ids = (0..tuples).map(|i| ((i * 7 + i / 13) % features as usize) as i32).collect();
    let values = (0..tuples).map(|i| ((i * 37) % 101) as f32 - 50.0).collect();
    (ids, values)
}

pub fn statistics_args(features: i64) -> Arguments {
    FindFeatureStatisticsFilter
        .parameters()
        .default_arguments()
        .with("feature_ids_path", "Cells/FeatureIds")
        .with("input_path", "Cells/Values")
        .with("number_of_features", features)
}
