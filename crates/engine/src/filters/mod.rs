//! Filters shipped with the engine
//!
//! Each filter is a unit struct; its arguments arrive through [`Arguments`]
//! and are described by its [`Parameters`](crate::Parameters).
//!
//! | Filter | Effect |
//! |--------|--------|
//! | [`CreateDataArrayFilter`] | new array filled with a constant |
//! | [`CreateImageGeometryFilter`] | new image grid with a cell attribute matrix |
//! | [`CopyDataObjectFilter`] | deep copy of a subgraph |
//! | [`RenameDataObjectFilter`] | rename an object everywhere it is linked |
//! | [`DeleteDataFilter`] | remove a link or erase an object |
//! | [`ConvertDataTypeFilter`] | copy an array into another element kind |
//! | [`FindFeatureStatisticsFilter`] | per-feature minimum and mean |
//!
//! [`Arguments`]: tessera_core::Arguments

mod convert_data_type;
mod copy_data_object;
mod create_data_array;
mod create_image_geometry;
mod delete_data;
mod feature_statistics;
mod rename_data_object;

pub use convert_data_type::ConvertDataTypeFilter;
pub use copy_data_object::CopyDataObjectFilter;
pub use create_data_array::CreateDataArrayFilter;
pub use create_image_geometry::CreateImageGeometryFilter;
pub use delete_data::DeleteDataFilter;
pub use feature_statistics::FindFeatureStatisticsFilter;
pub use rename_data_object::RenameDataObjectFilter;

use crate::filter::Filter;
use crate::result::Diagnostic;
use tessera_core::DataPath;
use tessera_storage::DataStructure;

/// Code for an output path that already resolves
pub const OUTPUT_EXISTS: i32 = -5001;
/// Code for an output path whose parent does not resolve
pub const OUTPUT_PARENT_MISSING: i32 = -5002;
/// Code for a shape argument with a zero or missing extent
pub const INVALID_SHAPE: i32 = -5003;

/// One prototype of every core filter
pub fn core_filters() -> Vec<Box<dyn Filter>> {
    vec![
        Box::new(CreateDataArrayFilter),
        Box::new(CreateImageGeometryFilter),
        Box::new(CopyDataObjectFilter),
        Box::new(RenameDataObjectFilter),
        Box::new(DeleteDataFilter),
        Box::new(ConvertDataTypeFilter),
        Box::new(FindFeatureStatisticsFilter),
    ]
}

/// Check that `path` can be created: not the root, free, parent present
pub(crate) fn check_output_path(ds: &DataStructure, path: &DataPath) -> Option<Diagnostic> {
    if path.is_root() {
        return Some(Diagnostic::new(
            OUTPUT_PARENT_MISSING,
            "output path must name an object",
        ));
    }
    if ds.contains(path) {
        return Some(Diagnostic::new(
            OUTPUT_EXISTS,
            format!("{} already exists", path),
        ));
    }
    let parent = path.get_parent();
    if !parent.is_root() && !ds.contains(&parent) {
        return Some(Diagnostic::new(
            OUTPUT_PARENT_MISSING,
            format!("parent {} of {} does not exist", parent, path),
        ));
    }
    None
}

/// True if every extent of a non-empty shape is positive
pub(crate) fn is_valid_shape(shape: &[usize]) -> bool {
    !shape.is_empty() && shape.iter().all(|&extent| extent > 0)
}
