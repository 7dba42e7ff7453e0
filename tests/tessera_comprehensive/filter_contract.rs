//! Filter Contract Tests
//!
//! Validation purity, declare-then-fill equality, action ordering and the
//! outcomes of the driver's state machine.

use crate::test_utils::*;

/// Structure a filter declares, applied to a metadata-only copy of `ds`
fn declared_structure(filter: &dyn Filter, ds: &DataStructure, args: &Arguments) -> DataStructure {
    let result = filter.preflight(ds, args, &CancelFlag::new());
    assert!(result.is_valid(), "{:?}", result.errors);
    let mut graph = ds.preflight_copy();
    result
        .actions
        .apply_all(&mut graph, ActionMode::Preflight)
        .unwrap();
    result
        .actions
        .apply_deferred(&mut graph, ActionMode::Preflight)
        .unwrap();
    graph
}

/// Run `filter` and check the result matches what it declared
fn assert_declared_equals_executed(filter: &dyn Filter, ds: &mut DataStructure, args: &Arguments) {
    let declared = declared_structure(filter, ds, args);
    let report = run_filter(filter, ds, args, &NullMessageHandler, &CancelFlag::new());
    assert!(report.is_completed(), "{}: {:?}", filter.name(), report.error);
    assert_eq!(signature(&declared), signature(ds), "{}", filter.name());
    ds.check_integrity().unwrap();
}

// =============================================================================
// Declare Then Fill
// =============================================================================

#[test]
fn test_declared_structure_matches_execution_for_every_core_filter() {
    init_tracing();
    let mut ds = feature_graph(vec![0, 1, 1, 2, 2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let image = CreateImageGeometryFilter
        .parameters()
        .default_arguments()
        .with("dimensions", vec![4usize, 3, 2]);
    assert_declared_equals_executed(&CreateImageGeometryFilter, &mut ds, &image);

    let array = CreateDataArrayFilter
        .parameters()
        .default_arguments()
        .with("data_type", DataType::UInt16)
        .with("fill_value", "3")
        .with("output_path", "Image Geometry/Cell Data/Phases");
    assert_declared_equals_executed(&CreateDataArrayFilter, &mut ds, &array);
    assert_eq!(
        ds.get_data_array(&path("Image Geometry/Cell Data/Phases"))
            .unwrap()
            .tuple_shape(),
        &[2, 3, 4]
    );

    let convert = ConvertDataTypeFilter
        .parameters()
        .default_arguments()
        .with("input_path", "Cells/Values")
        .with("output_type", DataType::Float64)
        .with("delete_original", true);
    assert_declared_equals_executed(&ConvertDataTypeFilter, &mut ds, &convert);

    assert_declared_equals_executed(&FindFeatureStatisticsFilter, &mut ds, &statistics_args(4));

    let copy = CopyDataObjectFilter
        .parameters()
        .default_arguments()
        .with("source_path", "Feature Data")
        .with("destination_path", "Feature Backup");
    assert_declared_equals_executed(&CopyDataObjectFilter, &mut ds, &copy);

    let rename = Arguments::new()
        .with("source_path", "Feature Backup")
        .with("new_name", "Archive");
    assert_declared_equals_executed(&RenameDataObjectFilter, &mut ds, &rename);

    let delete = DeleteDataFilter
        .parameters()
        .default_arguments()
        .with("removed_paths", vec![path("Archive")]);
    assert_declared_equals_executed(&DeleteDataFilter, &mut ds, &delete);

    assert!(ds.contains(&path("Feature Data/Mean")));
    assert!(!ds.contains(&path("Archive")));
}

// =============================================================================
// Validation Purity
// =============================================================================

#[test]
fn test_validate_leaves_graph_untouched_and_is_deterministic() {
    let ds = feature_graph(vec![0, 1, 2, 2], vec![5.0, 6.0, 7.0, 8.0]);
    let before = signature(&ds);
    let values = ds
        .get_array::<f32>(&path("Cells/Values"))
        .unwrap()
        .as_slice()
        .to_vec();

    let runs: Vec<(Box<dyn Filter>, Arguments)> = vec![
        (Box::new(FindFeatureStatisticsFilter), statistics_args(3)),
        (
            Box::new(ConvertDataTypeFilter),
            ConvertDataTypeFilter
                .parameters()
                .default_arguments()
                .with("input_path", "Cells/Values")
                .with("delete_original", true),
        ),
        (
            Box::new(DeleteDataFilter),
            Arguments::new()
                .with("removed_paths", vec![path("Cells")])
                .with("delete_mode", "object"),
        ),
    ];
    for (filter, args) in runs {
        let cancel = CancelFlag::new();
        let first = filter.preflight(&ds, &args, &cancel);
        let second = filter.preflight(&ds, &args, &cancel);
        assert!(first.is_valid(), "{}: {:?}", filter.name(), first.errors);
        assert_eq!(first, second, "{}", filter.name());
    }

    assert_eq!(signature(&ds), before);
    assert_eq!(
        ds.get_array::<f32>(&path("Cells/Values")).unwrap().as_slice(),
        &values[..]
    );
}

// =============================================================================
// Action Ordering
// =============================================================================

#[test]
fn test_actions_apply_in_list_order() {
    let mut actions = OutputActions::new();
    actions.push(Action::CreateGroup { path: path("A") });
    actions.push(Action::CreateArray {
        data_type: DataType::Int64,
        tuple_shape: vec![2],
        component_shape: vec![1],
        path: path("A/X"),
        fill_value: Some("4".to_string()),
    });
    actions.push(Action::Rename {
        path: path("A"),
        new_name: "B".to_string(),
    });

    let mut ds = DataStructure::new();
    actions.apply_all(&mut ds, ActionMode::Execute).unwrap();
    assert_eq!(ds.get_array::<i64>(&path("B/X")).unwrap().as_slice(), &[4, 4]);

    let mut reversed = OutputActions::new();
    for action in actions.actions.iter().rev() {
        reversed.push(action.clone());
    }
    let mut ds = DataStructure::new();
    let err = reversed.apply_all(&mut ds, ActionMode::Execute).unwrap_err();
    assert_eq!(err.index, 0);
    assert!(ds.is_empty());
}

#[test]
fn test_apply_stops_at_first_failure() {
    let mut actions = OutputActions::new();
    actions.push(Action::CreateGroup { path: path("A") });
    actions.push(Action::CreateGroup { path: path("A") });
    actions.push(Action::CreateGroup { path: path("C") });

    let mut ds = DataStructure::new();
    let err = actions.apply_all(&mut ds, ActionMode::Execute).unwrap_err();
    assert_eq!(err.index, 1);
    assert!(ds.contains(&path("A")));
    assert!(!ds.contains(&path("C")));
}

// =============================================================================
// Driver Outcomes
// =============================================================================

#[test]
fn test_validation_failure_leaves_graph_untouched() {
    let mut ds = feature_graph(vec![0, 1], vec![1.0, 2.0]);
    let before = signature(&ds);
    let args = statistics_args(2).with("input_path", "Cells/Missing");

    let messages = MessageCollector::new();
    let report = run_filter(&FindFeatureStatisticsFilter, &mut ds, &args, &messages, &CancelFlag::new());
    assert_eq!(report.state, FilterState::ValidationFailed);
    assert_eq!(
        report.history,
        vec![FilterState::Idle, FilterState::Validating, FilterState::ValidationFailed]
    );
    assert!(!messages.of_kind(MessageKind::Error).is_empty());
    assert_eq!(signature(&ds), before);
}

#[test]
fn test_cancel_before_run_stops_in_validation() {
    let mut ds = feature_graph(vec![0, 1], vec![1.0, 2.0]);
    let before = signature(&ds);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = run_filter(&FindFeatureStatisticsFilter, &mut ds, &statistics_args(2), &NullMessageHandler, &cancel);
    assert!(report.is_cancelled());
    assert_eq!(signature(&ds), before);
}

#[test]
fn test_execution_failure_keeps_applied_structure() {
    let mut ds = feature_graph(vec![0, 1, 9], vec![1.0, 2.0, 3.0]);
    let report = run_filter(&FindFeatureStatisticsFilter, &mut ds, &statistics_args(3), &NullMessageHandler, &CancelFlag::new());
    assert_eq!(report.state, FilterState::ExecutionFailed);
    assert!(matches!(report.error, Some(FilterError::Execution { .. })));
    assert!(ds.contains(&path("Feature Data/Minimum")));
}
