//! Error types for the data graph
//!
//! This module defines the faults raised by graph, store and path operations.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::data_type::DataType;
use crate::path::DataPath;
use crate::types::DataId;
use std::io;
use thiserror::Error;

/// Result type alias for data graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the data graph and its stores
#[derive(Debug, Error)]
pub enum Error {
    /// No object is reachable at the path
    #[error("object not found: {0}")]
    NotFound(DataPath),

    /// No object with this id is in the master table
    #[error("object id not found: {0}")]
    IdNotFound(DataId),

    /// An object with this id is already in the master table
    #[error("object id already in use: {0}")]
    IdInUse(DataId),

    /// Linking would make an object its own ancestor
    #[error("linking {object} under {parent} would create a cycle")]
    CycleDetected {
        /// Object being linked
        object: DataPath,
        /// Container it was to be linked under
        parent: DataPath,
    },

    /// The parent of a path to be created does not resolve
    #[error("parent not found: {0}")]
    ParentNotFound(DataPath),

    /// A sibling with the same name already exists under the parent
    #[error("duplicate name '{name}' under {parent}")]
    DuplicateName {
        /// Parent the insertion targeted
        parent: DataPath,
        /// Name already in use
        name: String,
    },

    /// Something already occupies the destination of a copy
    #[error("destination exists: {0}")]
    DestinationExists(DataPath),

    /// The parent object cannot hold children
    #[error("object at {0} cannot hold children")]
    NotAContainer(DataPath),

    /// Path syntax or segment is invalid
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending path text
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Typed access with the wrong scalar kind
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Kind requested by the caller
        expected: DataType,
        /// Kind stored in the buffer
        actual: DataType,
    },

    /// Object is of the wrong node type for the operation
    #[error("wrong object type at {path}: expected {expected}, found {actual}")]
    WrongObjectType {
        /// Path of the object
        path: DataPath,
        /// Node type required
        expected: &'static str,
        /// Node type found
        actual: &'static str,
    },

    /// Tuple or component index outside the store
    #[error("index out of range: {index} >= {len} ({axis})")]
    IndexOutOfRange {
        /// Axis that overflowed, "tuple" or "component"
        axis: &'static str,
        /// Requested index
        index: usize,
        /// Extent of the axis
        len: usize,
    },

    /// Shapes that must agree do not
    #[error("shape mismatch: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        /// Shape required
        expected: Vec<usize>,
        /// Shape found
        actual: Vec<usize>,
    },

    /// The store only carries metadata (created in preflight mode)
    #[error("data store at {0} is not allocated")]
    NotAllocated(DataPath),

    /// A value could not be parsed or converted
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error from the byte stream seam
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation observed the cancel flag
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build an `InvalidPath` error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Stable numeric code used when the error is reported as a diagnostic
    pub fn code(&self) -> i32 {
        match self {
            Error::NotFound(_) => -100,
            Error::IdNotFound(_) => -101,
            Error::IdInUse(_) => -107,
            Error::CycleDetected { .. } => -108,
            Error::ParentNotFound(_) => -102,
            Error::DuplicateName { .. } => -103,
            Error::DestinationExists(_) => -104,
            Error::NotAContainer(_) => -105,
            Error::InvalidPath { .. } => -106,
            Error::TypeMismatch { .. } => -110,
            Error::WrongObjectType { .. } => -111,
            Error::IndexOutOfRange { .. } => -112,
            Error::ShapeMismatch { .. } => -113,
            Error::NotAllocated(_) => -114,
            Error::InvalidArgument(_) => -120,
            Error::Io(_) => -130,
            Error::Cancelled => -1,
        }
    }
}
