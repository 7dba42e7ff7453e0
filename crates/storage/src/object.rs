//! Data graph objects
//!
//! A [`DataObject`] is one node of the data graph: an identity, a name and a
//! payload. Container payloads hold a [`ChildMap`] of name → id links. Links
//! are weak: they only name another entry of the owning table in
//! [`DataStructure`](crate::DataStructure) and never keep it alive.

use crate::geometry::GeometryData;
use crate::store::AnyDataStore;
use std::collections::BTreeMap;
use tessera_core::{DataId, DataObjectType, Shape};

/// Name-ordered child links of a container
pub type ChildMap = BTreeMap<String, DataId>;

/// Payload of a data graph object
#[derive(Debug, Clone, PartialEq)]
pub enum DataObjectKind {
    /// Pure grouping container
    Group {
        /// Child links
        children: ChildMap,
    },
    /// Container whose arrays all share `tuple_shape`
    AttributeMatrix {
        /// Child links
        children: ChildMap,
        /// Tuple shape every child array must have
        tuple_shape: Shape,
    },
    /// Geometry container
    Geometry {
        /// Child links
        children: ChildMap,
        /// Geometry metadata
        geometry: GeometryData,
    },
    /// Typed buffer
    DataArray(AnyDataStore),
}

impl DataObjectKind {
    fn children_mut(&mut self) -> Option<&mut ChildMap> {
        match self {
            DataObjectKind::Group { children }
            | DataObjectKind::AttributeMatrix { children, .. }
            | DataObjectKind::Geometry { children, .. } => Some(children),
            DataObjectKind::DataArray(_) => None,
        }
    }
}

/// One node of the data graph
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    id: DataId,
    name: String,
    kind: DataObjectKind,
}

impl DataObject {
    fn with_kind(name: impl Into<String>, kind: DataObjectKind) -> Self {
        Self {
            id: DataId::next(),
            name: name.into(),
            kind,
        }
    }

    /// New, unlinked group
    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            DataObjectKind::Group {
                children: ChildMap::new(),
            },
        )
    }

    /// New, unlinked attribute matrix
    pub fn attribute_matrix(name: impl Into<String>, tuple_shape: Shape) -> Self {
        Self::with_kind(
            name,
            DataObjectKind::AttributeMatrix {
                children: ChildMap::new(),
                tuple_shape,
            },
        )
    }

    /// New, unlinked geometry
    pub fn geometry(name: impl Into<String>, geometry: GeometryData) -> Self {
        Self::with_kind(
            name,
            DataObjectKind::Geometry {
                children: ChildMap::new(),
                geometry,
            },
        )
    }

    /// New, unlinked data array
    pub fn data_array(name: impl Into<String>, store: AnyDataStore) -> Self {
        Self::with_kind(name, DataObjectKind::DataArray(store))
    }

    /// Identity
    pub fn id(&self) -> DataId {
        self.id
    }

    /// Name used as the link key in every parent
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Payload
    pub fn kind(&self) -> &DataObjectKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut DataObjectKind {
        &mut self.kind
    }

    /// Node type tag
    pub fn object_type(&self) -> DataObjectType {
        match self.kind {
            DataObjectKind::Group { .. } => DataObjectType::Group,
            DataObjectKind::AttributeMatrix { .. } => DataObjectType::AttributeMatrix,
            DataObjectKind::Geometry { .. } => DataObjectType::Geometry,
            DataObjectKind::DataArray(_) => DataObjectType::DataArray,
        }
    }

    /// Child links, `None` for arrays
    pub fn children(&self) -> Option<&ChildMap> {
        match &self.kind {
            DataObjectKind::Group { children }
            | DataObjectKind::AttributeMatrix { children, .. }
            | DataObjectKind::Geometry { children, .. } => Some(children),
            DataObjectKind::DataArray(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut ChildMap> {
        self.kind.children_mut()
    }

    /// Buffer, `None` for containers
    pub fn store(&self) -> Option<&AnyDataStore> {
        match &self.kind {
            DataObjectKind::DataArray(store) => Some(store),
            _ => None,
        }
    }

    pub(crate) fn store_mut(&mut self) -> Option<&mut AnyDataStore> {
        match &mut self.kind {
            DataObjectKind::DataArray(store) => Some(store),
            _ => None,
        }
    }

    /// Tuple shape an attribute matrix imposes on its arrays
    pub fn required_tuple_shape(&self) -> Option<&[usize]> {
        match &self.kind {
            DataObjectKind::AttributeMatrix { tuple_shape, .. } => Some(tuple_shape),
            _ => None,
        }
    }

    /// Geometry metadata, `None` unless this is a geometry
    pub fn geometry_data(&self) -> Option<&GeometryData> {
        match &self.kind {
            DataObjectKind::Geometry { geometry, .. } => Some(geometry),
            _ => None,
        }
    }

    pub(crate) fn geometry_data_mut(&mut self) -> Option<&mut GeometryData> {
        match &mut self.kind {
            DataObjectKind::Geometry { geometry, .. } => Some(geometry),
            _ => None,
        }
    }

    /// Detached copy with a fresh id and no child links
    ///
    /// The buffer of an array is duplicated; containers come back empty.
    pub fn duplicate_detached(&self) -> DataObject {
        let mut kind = self.kind.clone();
        if let Some(children) = kind.children_mut() {
            children.clear();
        }
        Self::with_kind(self.name.clone(), kind)
    }

    /// Same id and links, with an array buffer reduced to its metadata
    pub(crate) fn metadata_only(&self) -> DataObject {
        let kind = match &self.kind {
            DataObjectKind::DataArray(store) => DataObjectKind::DataArray(AnyDataStore::empty(
                store.data_type(),
                store.tuple_shape().to_vec(),
                store.component_shape().to_vec(),
            )),
            other => other.clone(),
        };
        Self {
            id: self.id,
            name: self.name.clone(),
            kind,
        }
    }

    /// Copy with a fresh id and a new name, keeping child links as they are
    pub(crate) fn duplicate_linked(&self, name: String) -> DataObject {
        Self::with_kind(name, self.kind.clone())
    }
}
