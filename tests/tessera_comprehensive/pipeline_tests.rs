//! Pipeline Tests
//!
//! Whole workflows: preflight against declared outputs, execution on a
//! configured runner, and save/load through the registry.

use crate::test_utils::*;
use tempfile::TempDir;

fn workflow() -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.push_filter(
        Box::new(ConvertDataTypeFilter),
        ConvertDataTypeFilter
            .parameters()
            .default_arguments()
            .with("input_path", "Cells/Values")
            .with("output_type", DataType::Float64)
            .with("delete_original", true),
    );
    pipeline.push_filter(Box::new(FindFeatureStatisticsFilter), statistics_args(4));
    pipeline.push_filter(
        Box::new(CopyDataObjectFilter),
        Arguments::new()
            .with("source_path", "Feature Data")
            .with("destination_path", "Feature Backup"),
    );
    pipeline.push_filter(
        Box::new(DeleteDataFilter),
        Arguments::new()
            .with("removed_paths", vec![path("Cells/FeatureIds")])
            .with("delete_mode", "object"),
    );
    pipeline
}

fn cells() -> DataStructure {
    feature_graph(vec![0, 1, 1, 2, 3, 3, 3], vec![9.0, 1.0, 3.0, -2.0, 4.0, 5.0, 6.0])
}

#[test]
fn test_workflow_preflight_then_execute() {
    init_tracing();
    let pipeline = workflow();
    let mut ds = cells();
    let before = signature(&ds);

    let preflight = pipeline.preflight(&ds, &CancelFlag::new());
    assert!(preflight.is_valid(), "{:?}", preflight.results);
    assert_eq!(signature(&ds), before);

    let messages = MessageCollector::new();
    let report = pipeline.execute(&mut ds, &messages, &CancelFlag::new());
    assert!(report.is_completed(), "{:?}", report.failure());
    assert_eq!(report.reports.len(), 4);

    assert_eq!(
        ds.get_data_array(&path("Cells/Values")).unwrap().data_type(),
        DataType::Float64
    );
    assert!(!ds.contains(&path("Cells/FeatureIds")));
    let mean = ds.get_array::<f64>(&path("Feature Backup/Mean")).unwrap();
    assert_eq!(mean.as_slice(), &[0.0, 2.0, -2.0, 5.0]);
    ds.check_integrity().unwrap();
}

#[test]
fn test_workflow_preflight_flags_broken_dependency() {
    let mut pipeline = workflow();
    pipeline.nodes_mut()[1].enabled = false;

    let preflight = pipeline.preflight(&cells(), &CancelFlag::new());
    assert_eq!(preflight.first_invalid(), Some(2));
    assert!(preflight.results[1].is_none());
}

#[test]
fn test_saved_workflow_reproduces_results() {
    let registry = FilterRegistry::with_core_filters();
    let text = workflow().to_json().unwrap();
    let loaded = Pipeline::from_json(&text, &registry).unwrap();
    assert_eq!(loaded.len(), 4);

    let mut original = cells();
    let mut reloaded = cells();
    assert!(workflow()
        .execute(&mut original, &NullMessageHandler, &CancelFlag::new())
        .is_completed());
    assert!(loaded
        .execute(&mut reloaded, &NullMessageHandler, &CancelFlag::new())
        .is_completed());
    assert_eq!(signature(&original), signature(&reloaded));
    assert_eq!(
        original.get_array::<f64>(&path("Feature Data/Minimum")).unwrap(),
        reloaded.get_array::<f64>(&path("Feature Data/Minimum")).unwrap()
    );
}

#[test]
fn test_workflow_on_configured_runner() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join(tessera::engine::CONFIG_FILE_NAME);
    std::fs::write(
        &file,
        "progress_interval_ms = 50\n\n[parallel]\nenabled = true\nmax_threads = 2\nmin_grain_size = 1\n",
    )
    .unwrap();

    let config = EngineConfig::from_file(&file).unwrap();
    assert_eq!(config.parallel.max_threads, Some(2));
    let handler = config.message_handler("workflow");
    assert_eq!(handler.progress_interval(), std::time::Duration::from_millis(50));

    let pipeline = workflow().with_runner(config.runner());
    let mut ds = cells();
    let report = pipeline.execute(&mut ds, &handler, &CancelFlag::new());
    assert!(report.is_completed(), "{:?}", report.failure());
    assert!(ds.contains(&path("Feature Backup/Minimum")));
}

#[test]
fn test_cancelled_workflow_stops_at_first_node() {
    let pipeline = workflow();
    let mut ds = cells();
    let before = signature(&ds);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = pipeline.execute(&mut ds, &NullMessageHandler, &cancel);
    assert!(!report.is_completed());
    assert_eq!(report.reports.len(), 1);
    assert!(report.reports[0].1.is_cancelled());
    assert_eq!(signature(&ds), before);
}
