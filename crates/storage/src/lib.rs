//! Storage layer for tessera
//!
//! This crate implements the data graph and its buffers:
//! - DataStore / AnyDataStore: typed, tuple-shaped buffers
//! - DataObject: groups, attribute matrices, geometries and arrays
//! - DataStructure: owning id table plus weak name links
//! - io: little-endian byte stream seam for buffers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod geometry;
pub mod io;
pub mod object;
pub mod store;
pub mod structure;

pub use geometry::{GeometryData, GeometryKind, ImageGeometry, NodeGeometry};
pub use object::{ChildMap, DataObject, DataObjectKind};
pub use store::{AnyDataStore, DataStore, EmptyDataStore, StoreElement};
pub use structure::DataStructure;
