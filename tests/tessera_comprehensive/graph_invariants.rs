//! Graph Invariant Tests
//!
//! Multi-parent links, cascading erase, deep copy isolation and the textual
//! path form.

use crate::test_utils::*;
use proptest::prelude::*;

// =============================================================================
// Links and Erase
// =============================================================================

#[test]
fn test_shared_object_visible_from_both_parents() {
    let mut ds = DataStructure::new();
    ds.create_group("A", &DataPath::root()).unwrap();
    ds.create_group("B", &DataPath::root()).unwrap();
    let id = ds
        .create_data_array(&path("A"), "X", DataType::Int32, vec![4], vec![1])
        .unwrap();
    ds.add_link(&path("A/X"), &path("B")).unwrap();

    assert_eq!(ds.resolve(&path("A/X")).unwrap(), id);
    assert_eq!(ds.resolve(&path("B/X")).unwrap(), id);
    assert_eq!(ds.paths_of(id).len(), 2);

    ds.get_array_mut::<i32>(&path("A/X")).unwrap().set(2, 0, 9).unwrap();
    assert_eq!(ds.get_array::<i32>(&path("B/X")).unwrap().get(2, 0).unwrap(), 9);
}

#[test]
fn test_removing_last_link_keeps_object_until_erased() {
    let mut ds = DataStructure::new();
    ds.create_group("A", &DataPath::root()).unwrap();
    ds.create_group("B", &DataPath::root()).unwrap();
    let shared = ds.create_group("Shared", &path("A")).unwrap();
    let x = ds
        .create_data_array(&path("A/Shared"), "X", DataType::Float32, vec![2], vec![1])
        .unwrap();
    ds.add_link(&path("A/Shared"), &path("B")).unwrap();
    assert_eq!(ds.len(), 4);

    ds.remove_link(&path("A/Shared")).unwrap();
    assert!(ds.contains(&path("B/Shared/X")));
    assert!(ds.unlinked_ids().is_empty());

    ds.remove_link(&path("B/Shared")).unwrap();
    assert!(!ds.contains(&path("B/Shared")));
    assert_eq!(ds.len(), 4);
    assert!(ds.contains_id(shared));
    assert!(ds.contains_id(x));
    assert_eq!(ds.unlinked_ids(), vec![shared]);
    ds.check_integrity().unwrap();

    ds.erase(shared).unwrap();
    assert_eq!(ds.len(), 2);
    assert!(!ds.contains_id(x));
    ds.check_integrity().unwrap();
}

#[test]
fn test_erase_drops_every_link() {
    let mut ds = DataStructure::new();
    ds.create_group("A", &DataPath::root()).unwrap();
    ds.create_group("B", &DataPath::root()).unwrap();
    let id = ds.create_group("Shared", &path("A")).unwrap();
    ds.add_link(&path("A/Shared"), &path("B")).unwrap();

    ds.erase(id).unwrap();
    assert!(!ds.contains(&path("A/Shared")));
    assert!(!ds.contains(&path("B/Shared")));
    assert!(ds.get(id).is_none());
    ds.check_integrity().unwrap();
}

#[test]
fn test_duplicate_name_rejected() {
    let mut ds = DataStructure::new();
    ds.create_group("A", &DataPath::root()).unwrap();
    assert!(ds.create_group("A", &DataPath::root()).is_err());
    assert_eq!(ds.len(), 1);
}

#[test]
fn test_array_under_attribute_matrix_must_match_tuples() {
    let mut ds = DataStructure::new();
    ds.create_attribute_matrix("Cells", &DataPath::root(), vec![3, 2])
        .unwrap();
    assert!(ds
        .create_data_array(&path("Cells"), "Bad", DataType::UInt8, vec![5], vec![1])
        .is_err());
    ds.create_data_array(&path("Cells"), "Good", DataType::UInt8, vec![3, 2], vec![1])
        .unwrap();
    assert_eq!(ds.get_attribute_matrix_shape(&path("Cells")).unwrap(), &[3, 2]);
}

// =============================================================================
// Deep Copy Isolation
// =============================================================================

#[test]
fn test_deep_copy_is_isolated() {
    let mut ds = DataStructure::new();
    ds.create_group("Source", &DataPath::root()).unwrap();
    let store = DataStore::from_vec(vec![3], vec![1], vec![1.0f64, 2.0, 3.0]).unwrap();
    ds.create_data_array_with(&path("Source"), "Values", store)
        .unwrap();

    let copy = ds.deep_copy(&path("Source"), &path("Copy")).unwrap();
    assert_ne!(copy, ds.resolve(&path("Source")).unwrap());
    assert_ne!(
        ds.resolve(&path("Copy/Values")).unwrap(),
        ds.resolve(&path("Source/Values")).unwrap()
    );

    ds.get_array_mut::<f64>(&path("Copy/Values"))
        .unwrap()
        .fill(-1.0);
    assert_eq!(
        ds.get_array::<f64>(&path("Source/Values")).unwrap().as_slice(),
        &[1.0, 2.0, 3.0]
    );
    ds.check_integrity().unwrap();
}

#[test]
fn test_deep_copy_into_own_subtree_rejected() {
    let mut ds = DataStructure::new();
    ds.create_group("Source", &DataPath::root()).unwrap();
    ds.create_group("Inner", &path("Source")).unwrap();
    let before = ds.len();

    assert!(ds.deep_copy(&path("Source"), &path("Source/Inner/Copy")).is_err());
    assert!(ds.deep_copy(&path("Source"), &path("Source")).is_err());
    assert_eq!(ds.len(), before);
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn test_path_helpers() {
    let p = path("Image/Cell Data/Phases");
    assert_eq!(p.len(), 3);
    assert_eq!(p.target_name(), Some("Phases"));
    assert_eq!(p.get_parent(), path("Image/Cell Data"));
    assert!(path("Image").is_ancestor_of(&p));
    assert_eq!(
        p.replace_prefix(&path("Image"), &path("Grid")).unwrap(),
        path("Grid/Cell Data/Phases")
    );
    assert!("A//B".parse::<DataPath>().is_err());
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _.-]{1,12}"
}

proptest! {
    #[test]
    fn fuzz_path_text_round_trip(segments in prop::collection::vec(segment(), 0..6)) {
        let p = DataPath::from_segments(segments.clone()).unwrap();
        let parsed: DataPath = p.to_path_string().parse().unwrap();
        prop_assert_eq!(parsed.segments(), &segments[..]);
        prop_assert_eq!(parsed, p);
    }
}
