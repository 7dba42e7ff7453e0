//! Declarative graph mutations
//!
//! An [`Action`] describes one structural change to a [`DataStructure`].
//! Filters return actions from validation instead of touching the graph; the
//! driver applies them in list order right before execute. Applying the same
//! list in [`ActionMode::Preflight`] produces the same structure with
//! metadata-only stores, which is how a pipeline shows later filters the
//! outputs of earlier ones without allocating anything.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{dispatch_data_type, DataPath, DataType, Error, Result, Scalar, Shape};
use tessera_storage::{
    AnyDataStore, DataStructure, GeometryData, GeometryKind, ImageGeometry, NodeGeometry,
};
use tracing::debug;

/// Default name of the vertex list child of a node geometry
pub const DEFAULT_VERTEX_LIST_NAME: &str = "SharedVertexList";

/// Default name of the element connectivity child of a node geometry
pub const DEFAULT_CONNECTIVITY_NAME: &str = "SharedElementList";

/// Whether applied actions allocate buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionMode {
    /// Create metadata-only stores
    Preflight,
    /// Allocate and fill stores
    Execute,
}

/// What a delete removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Remove the one link named by the path; the object stays in the owning
    /// table
    JustPath,
    /// Erase the object and drop every link to it
    JustObject,
}

/// One declarative structural change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Create a data array
    CreateArray {
        /// Scalar kind
        data_type: DataType,
        /// Tuple shape
        tuple_shape: Shape,
        /// Component shape
        component_shape: Shape,
        /// Path of the new array
        path: DataPath,
        /// Initial value, parsed for `data_type`; zero when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill_value: Option<String>,
    },
    /// Create a plain group
    CreateGroup {
        /// Path of the new group
        path: DataPath,
    },
    /// Create an attribute matrix
    CreateAttributeMatrix {
        /// Path of the new matrix
        path: DataPath,
        /// Tuple shape its arrays must share
        tuple_shape: Shape,
    },
    /// Create an image geometry, optionally with a cell attribute matrix
    CreateImageGeometry {
        /// Path of the new geometry
        path: DataPath,
        /// Cells along x, y, z
        dims: [usize; 3],
        /// Grid origin
        origin: [f32; 3],
        /// Cell size
        spacing: [f32; 3],
        /// Name of the cell attribute matrix to create
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_data_name: Option<String>,
    },
    /// Create a node based geometry with its vertex list and connectivity
    CreateNodeGeometry {
        /// Mesh kind; must be node based
        kind: GeometryKind,
        /// Path of the new geometry
        path: DataPath,
        /// Number of shared vertices
        num_vertices: usize,
        /// Number of elements
        num_elements: usize,
        /// Name of the vertex list child
        vertex_list_name: String,
        /// Name of the connectivity child; ignored for vertex geometries
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connectivity_name: Option<String>,
        /// Name of the per-element attribute matrix to create
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element_data_name: Option<String>,
    },
    /// Rename an object in every container that links it
    Rename {
        /// Object to rename
        path: DataPath,
        /// New name
        new_name: String,
    },
    /// Move a link under another container
    Move {
        /// Object to move
        path: DataPath,
        /// New parent
        new_parent: DataPath,
    },
    /// Remove a link or erase an object
    Delete {
        /// Object to delete
        path: DataPath,
        /// What to remove
        mode: DeleteMode,
    },
    /// Deep copy a subgraph
    Copy {
        /// Root of the subgraph
        source: DataPath,
        /// Path of the copy; its last segment names the copy
        dest: DataPath,
    },
}

fn split_target(path: &DataPath) -> Result<(DataPath, String)> {
    let name = path
        .target_name()
        .ok_or_else(|| Error::invalid_path("", "cannot create an object at the root"))?;
    Ok((path.get_parent(), name.to_string()))
}

fn store_for(
    mode: ActionMode,
    data_type: DataType,
    tuple_shape: Shape,
    component_shape: Shape,
    fill_value: Option<&str>,
) -> Result<AnyDataStore> {
    match (mode, fill_value) {
        (ActionMode::Preflight, fill) => {
            if let Some(fill) = fill {
                dispatch_data_type!(data_type, T => T::parse_value(fill).map(|_| ()))?;
            }
            Ok(AnyDataStore::empty(data_type, tuple_shape, component_shape))
        }
        (ActionMode::Execute, Some(fill)) => {
            AnyDataStore::allocate_filled(data_type, tuple_shape, component_shape, fill)
        }
        (ActionMode::Execute, None) => Ok(AnyDataStore::allocate(
            data_type,
            tuple_shape,
            component_shape,
        )),
    }
}

impl Action {
    /// Short name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateArray { .. } => "CreateArray",
            Action::CreateGroup { .. } => "CreateGroup",
            Action::CreateAttributeMatrix { .. } => "CreateAttributeMatrix",
            Action::CreateImageGeometry { .. } => "CreateImageGeometry",
            Action::CreateNodeGeometry { .. } => "CreateNodeGeometry",
            Action::Rename { .. } => "Rename",
            Action::Move { .. } => "Move",
            Action::Delete { .. } => "Delete",
            Action::Copy { .. } => "Copy",
        }
    }

    /// Apply this action to the graph
    ///
    /// A failing action may leave part of its own change behind (a geometry
    /// whose child creation failed stays in the graph).
    pub fn apply(&self, ds: &mut DataStructure, mode: ActionMode) -> Result<()> {
        debug!(target: "tessera::action", action = %self, ?mode, "apply");
        match self {
            Action::CreateArray {
                data_type,
                tuple_shape,
                component_shape,
                path,
                fill_value,
            } => {
                let (parent, name) = split_target(path)?;
                let store = store_for(
                    mode,
                    *data_type,
                    tuple_shape.clone(),
                    component_shape.clone(),
                    fill_value.as_deref(),
                )?;
                ds.create_data_array_with(&parent, name, store)?;
            }
            Action::CreateGroup { path } => {
                let (parent, name) = split_target(path)?;
                ds.create_group(name, &parent)?;
            }
            Action::CreateAttributeMatrix { path, tuple_shape } => {
                let (parent, name) = split_target(path)?;
                ds.create_attribute_matrix(name, &parent, tuple_shape.clone())?;
            }
            Action::CreateImageGeometry {
                path,
                dims,
                origin,
                spacing,
                cell_data_name,
            } => {
                let (parent, name) = split_target(path)?;
                let image = ImageGeometry {
                    dims: *dims,
                    origin: *origin,
                    spacing: *spacing,
                    cell_data: cell_data_name.clone(),
                };
                let cell_shape = image.cell_tuple_shape();
                ds.create_geometry(name, &parent, GeometryData::Image(image))?;
                if let Some(cell) = cell_data_name {
                    ds.create_attribute_matrix(cell.clone(), path, cell_shape)?;
                }
            }
            Action::CreateNodeGeometry {
                kind,
                path,
                num_vertices,
                num_elements,
                vertex_list_name,
                connectivity_name,
                element_data_name,
            } => {
                let per_element = kind.vertices_per_element().ok_or_else(|| {
                    Error::invalid_argument(format!("{} is not a node based geometry", kind))
                })?;
                let (parent, name) = split_target(path)?;
                let connectivity = match kind {
                    GeometryKind::Vertex => None,
                    _ => Some(
                        connectivity_name
                            .clone()
                            .unwrap_or_else(|| DEFAULT_CONNECTIVITY_NAME.to_string()),
                    ),
                };
                let node = NodeGeometry {
                    kind: *kind,
                    vertex_list: vertex_list_name.clone(),
                    connectivity: connectivity.clone(),
                    element_data: element_data_name.clone(),
                };
                ds.create_geometry(name, &parent, GeometryData::Node(node))?;

                let vertices = store_for(mode, DataType::Float32, vec![*num_vertices], vec![3], None)?;
                ds.create_data_array_with(path, vertex_list_name.clone(), vertices)?;
                let elements = match kind {
                    GeometryKind::Vertex => *num_vertices,
                    _ => *num_elements,
                };
                if let Some(connectivity) = connectivity {
                    let store = store_for(
                        mode,
                        DataType::UInt64,
                        vec![elements],
                        vec![per_element],
                        None,
                    )?;
                    ds.create_data_array_with(path, connectivity, store)?;
                }
                if let Some(element_data) = element_data_name {
                    ds.create_attribute_matrix(element_data.clone(), path, vec![elements])?;
                }
            }
            Action::Rename { path, new_name } => ds.rename(path, new_name)?,
            Action::Move { path, new_parent } => ds.move_object(path, new_parent)?,
            Action::Delete { path, mode } => match mode {
                DeleteMode::JustPath => {
                    ds.remove_link(path)?;
                }
                DeleteMode::JustObject => {
                    let id = ds.resolve(path)?;
                    ds.erase(id)?;
                }
            },
            Action::Copy { source, dest } => {
                ds.deep_copy(source, dest)?;
            }
        }
        Ok(())
    }

    /// Paths this action brings into existence when applied
    pub fn created_paths(&self) -> Vec<DataPath> {
        let child = |parent: &DataPath, name: &str| parent.create_child_path(name).ok();
        match self {
            Action::CreateArray { path, .. }
            | Action::CreateGroup { path }
            | Action::CreateAttributeMatrix { path, .. } => vec![path.clone()],
            Action::CreateImageGeometry {
                path,
                cell_data_name,
                ..
            } => std::iter::once(path.clone())
                .chain(cell_data_name.as_deref().and_then(|c| child(path, c)))
                .collect(),
            Action::CreateNodeGeometry {
                kind,
                path,
                vertex_list_name,
                connectivity_name,
                element_data_name,
                ..
            } => {
                let connectivity = match kind {
                    GeometryKind::Vertex => None,
                    _ => Some(connectivity_name.as_deref().unwrap_or(DEFAULT_CONNECTIVITY_NAME)),
                };
                std::iter::once(path.clone())
                    .chain(child(path, vertex_list_name))
                    .chain(connectivity.and_then(|c| child(path, c)))
                    .chain(element_data_name.as_deref().and_then(|e| child(path, e)))
                    .collect()
            }
            Action::Rename { path, new_name } => path.replace_name(new_name.as_str()).into_iter().collect(),
            Action::Move { path, new_parent } => path
                .target_name()
                .and_then(|name| child(new_parent, name))
                .into_iter()
                .collect(),
            Action::Delete { .. } => Vec::new(),
            Action::Copy { dest, .. } => vec![dest.clone()],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateArray {
                data_type,
                tuple_shape,
                component_shape,
                path,
                ..
            } => write!(
                f,
                "CreateArray({} {} {:?}x{:?})",
                path, data_type, tuple_shape, component_shape
            ),
            Action::CreateGroup { path } => write!(f, "CreateGroup({})", path),
            Action::CreateAttributeMatrix { path, tuple_shape } => {
                write!(f, "CreateAttributeMatrix({} {:?})", path, tuple_shape)
            }
            Action::CreateImageGeometry { path, dims, .. } => {
                write!(f, "CreateImageGeometry({} {:?})", path, dims)
            }
            Action::CreateNodeGeometry { kind, path, .. } => {
                write!(f, "CreateNodeGeometry({} {})", path, kind)
            }
            Action::Rename { path, new_name } => write!(f, "Rename({} -> {})", path, new_name),
            Action::Move { path, new_parent } => write!(f, "Move({} -> {})", path, new_parent),
            Action::Delete { path, mode } => write!(f, "Delete({} {:?})", path, mode),
            Action::Copy { source, dest } => write!(f, "Copy({} -> {})", source, dest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DataPath {
        s.parse().unwrap()
    }

    fn create_array(p: &str, fill: Option<&str>) -> Action {
        Action::CreateArray {
            data_type: DataType::Float32,
            tuple_shape: vec![4],
            component_shape: vec![2],
            path: path(p),
            fill_value: fill.map(str::to_string),
        }
    }

    #[test]
    fn test_create_array_execute_allocates_and_fills() {
        let mut ds = DataStructure::new();
        create_array("X", Some("1.5"))
            .apply(&mut ds, ActionMode::Execute)
            .unwrap();
        let store = ds.get_array::<f32>(&path("X")).unwrap();
        assert_eq!(store.len(), 8);
        assert!(store.as_slice().iter().all(|v| *v == 1.5));
    }

    #[test]
    fn test_create_array_preflight_is_metadata_only() {
        let mut ds = DataStructure::new();
        create_array("X", None)
            .apply(&mut ds, ActionMode::Preflight)
            .unwrap();
        let store = ds.get_data_array(&path("X")).unwrap();
        assert!(!store.is_allocated());
        assert_eq!(store.number_of_tuples(), 4);
        assert_eq!(store.number_of_components(), 2);
    }

    #[test]
    fn test_bad_fill_value_fails_in_both_modes() {
        for mode in [ActionMode::Preflight, ActionMode::Execute] {
            let mut ds = DataStructure::new();
            assert!(create_array("X", Some("abc")).apply(&mut ds, mode).is_err());
        }
    }

    #[test]
    fn test_create_at_root_path_fails() {
        let mut ds = DataStructure::new();
        let err = Action::CreateGroup {
            path: DataPath::root(),
        }
        .apply(&mut ds, ActionMode::Execute)
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_image_geometry_with_cell_data() {
        let mut ds = DataStructure::new();
        let action = Action::CreateImageGeometry {
            path: path("Image"),
            dims: [4, 3, 2],
            origin: [0.0; 3],
            spacing: [1.0; 3],
            cell_data_name: Some("Cell Data".to_string()),
        };
        action.apply(&mut ds, ActionMode::Execute).unwrap();
        assert_eq!(
            ds.get_attribute_matrix_shape(&path("Image/Cell Data")).unwrap(),
            &[2, 3, 4]
        );
        assert_eq!(
            action.created_paths(),
            vec![path("Image"), path("Image/Cell Data")]
        );
    }

    #[test]
    fn test_triangle_geometry_children() {
        let mut ds = DataStructure::new();
        let action = Action::CreateNodeGeometry {
            kind: GeometryKind::Triangle,
            path: path("Mesh"),
            num_vertices: 5,
            num_elements: 3,
            vertex_list_name: DEFAULT_VERTEX_LIST_NAME.to_string(),
            connectivity_name: None,
            element_data_name: Some("Face Data".to_string()),
        };
        action.apply(&mut ds, ActionMode::Execute).unwrap();
        let verts = ds.get_array::<f32>(&path("Mesh/SharedVertexList")).unwrap();
        assert_eq!((verts.number_of_tuples(), verts.number_of_components()), (5, 3));
        let conn = ds.get_array::<u64>(&path("Mesh/SharedElementList")).unwrap();
        assert_eq!((conn.number_of_tuples(), conn.number_of_components()), (3, 3));
        assert_eq!(
            ds.get_attribute_matrix_shape(&path("Mesh/Face Data")).unwrap(),
            &[3]
        );
        let created = action.created_paths();
        assert_eq!(created.len(), 4);
        for p in created {
            assert!(ds.contains(&p), "{} missing", p);
        }
    }

    #[test]
    fn test_node_geometry_rejects_image_kind() {
        let mut ds = DataStructure::new();
        let err = Action::CreateNodeGeometry {
            kind: GeometryKind::Image,
            path: path("Mesh"),
            num_vertices: 1,
            num_elements: 1,
            vertex_list_name: "V".to_string(),
            connectivity_name: None,
            element_data_name: None,
        }
        .apply(&mut ds, ActionMode::Execute)
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(ds.is_empty());
    }

    #[test]
    fn test_delete_modes() {
        let mut ds = DataStructure::new();
        ds.create_group("A", &DataPath::root()).unwrap();
        ds.create_group("B", &DataPath::root()).unwrap();
        ds.create_group("Shared", &path("A")).unwrap();
        ds.add_link(&path("A/Shared"), &path("B")).unwrap();

        Action::Delete {
            path: path("A/Shared"),
            mode: DeleteMode::JustPath,
        }
        .apply(&mut ds, ActionMode::Execute)
        .unwrap();
        assert!(ds.contains(&path("B/Shared")));

        ds.add_link(&path("B/Shared"), &path("A")).unwrap();
        Action::Delete {
            path: path("A/Shared"),
            mode: DeleteMode::JustObject,
        }
        .apply(&mut ds, ActionMode::Execute)
        .unwrap();
        assert!(!ds.contains(&path("B/Shared")));
    }

    #[test]
    fn test_created_paths_for_moves() {
        let rename = Action::Rename {
            path: path("A/b"),
            new_name: "c".to_string(),
        };
        assert_eq!(rename.created_paths(), vec![path("A/c")]);
        let mv = Action::Move {
            path: path("A/b"),
            new_parent: path("Z"),
        };
        assert_eq!(mv.created_paths(), vec![path("Z/b")]);
    }

    #[test]
    fn test_action_serde_tagged() {
        let action = Action::Copy {
            source: path("A"),
            dest: path("B"),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "Copy");
        assert_eq!(json["source"], "A");
        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
