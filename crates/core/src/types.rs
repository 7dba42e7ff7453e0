//! Core identity types
//!
//! This module defines:
//! - DataId: process-unique identity of a data graph object
//! - DataObjectType: node type tag
//! - Shape helpers for tuple and component shapes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DATA_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a data graph object
///
/// Ids are never reused within a process, so ids of a deep copy are always
/// disjoint from the ids of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataId(u64);

impl DataId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_DATA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw integer value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type tag of a data graph object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataObjectType {
    /// Pure grouping container
    Group,
    /// Container whose child arrays share one tuple shape
    AttributeMatrix,
    /// Geometry container (image grid or node based mesh)
    Geometry,
    /// Typed buffer with tuple and component shape
    DataArray,
}

impl DataObjectType {
    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            DataObjectType::Group => "Group",
            DataObjectType::AttributeMatrix => "AttributeMatrix",
            DataObjectType::Geometry => "Geometry",
            DataObjectType::DataArray => "DataArray",
        }
    }

    /// True if objects of this type can hold children
    pub fn is_container(&self) -> bool {
        !matches!(self, DataObjectType::DataArray)
    }
}

impl fmt::Display for DataObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tuple or component shape, slowest varying dimension first
pub type Shape = Vec<usize>;

/// Number of elements described by a shape (1 for an empty shape)
pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().product()
}
