//! Core types for Tessera
//!
//! This crate defines the foundational types used throughout the system:
//! - DataId: process-unique identity of a data graph object
//! - DataObjectType: node type tag (Group, AttributeMatrix, Geometry, DataArray)
//! - DataPath: path addressing into the data graph
//! - DataType / Scalar: closed set of array element kinds and their Rust types
//! - Value / Arguments: flat, dynamically typed filter arguments
//! - CancelFlag: shared cooperative cancellation flag
//! - Error: error type for graph, store and path operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod data_type;
pub mod error;
pub mod path;
pub mod types;
pub mod value;

pub use cancel::CancelFlag;
pub use data_type::{DataType, Scalar};
pub use error::{Error, Result};
pub use path::{DataPath, PATH_SEPARATOR};
pub use types::{shape_size, DataId, DataObjectType, Shape};
pub use value::{Arguments, Value, ValueKind};
