//! Geometry metadata
//!
//! Geometries are containers. An image geometry is fully described by its
//! dimensions, origin and spacing. Node based geometries (vertex, edge,
//! triangle, ...) keep their shared vertex list and element connectivity as
//! child arrays and record only the child *names* here, so they resolve
//! through the same weak links as everything else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a geometry container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Regular grid of cells
    Image,
    /// Rectilinear grid with per-axis bounds
    RectGrid,
    /// Point cloud
    Vertex,
    /// Line segments
    Edge,
    /// Triangle mesh
    Triangle,
    /// Quadrilateral mesh
    Quad,
    /// Tetrahedral mesh
    Tetrahedral,
    /// Hexahedral mesh
    Hexahedral,
}

impl GeometryKind {
    /// Number of vertices referenced by one element, `None` for grids
    pub fn vertices_per_element(&self) -> Option<usize> {
        match self {
            GeometryKind::Image | GeometryKind::RectGrid => None,
            GeometryKind::Vertex => Some(1),
            GeometryKind::Edge => Some(2),
            GeometryKind::Triangle => Some(3),
            GeometryKind::Quad | GeometryKind::Tetrahedral => Some(4),
            GeometryKind::Hexahedral => Some(8),
        }
    }

    /// True for the mesh kinds that own a vertex list
    pub fn is_node_based(&self) -> bool {
        self.vertices_per_element().is_some()
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Regular grid metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// Cells along x, y, z
    pub dims: [usize; 3],
    /// Position of the first cell corner
    pub origin: [f32; 3],
    /// Cell size along x, y, z
    pub spacing: [f32; 3],
    /// Name of the cell attribute matrix child, if one was created
    pub cell_data: Option<String>,
}

impl ImageGeometry {
    /// Total number of cells
    pub fn number_of_cells(&self) -> usize {
        self.dims.iter().product()
    }

    /// Tuple shape of cell data, slowest axis first (z, y, x)
    pub fn cell_tuple_shape(&self) -> Vec<usize> {
        vec![self.dims[2], self.dims[1], self.dims[0]]
    }

    /// Far corner of the grid
    pub fn max_bounds(&self) -> [f32; 3] {
        [
            self.origin[0] + self.dims[0] as f32 * self.spacing[0],
            self.origin[1] + self.dims[1] as f32 * self.spacing[1],
            self.origin[2] + self.dims[2] as f32 * self.spacing[2],
        ]
    }
}

/// Mesh metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGeometry {
    /// Mesh kind
    pub kind: GeometryKind,
    /// Name of the `float32 [n][3]` shared vertex list child
    pub vertex_list: String,
    /// Name of the `uint64 [m][k]` connectivity child; absent for vertex geometries
    pub connectivity: Option<String>,
    /// Name of the per-element attribute matrix child
    pub element_data: Option<String>,
}

/// Geometry payload of a geometry container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryData {
    /// Grid geometry
    Image(ImageGeometry),
    /// Mesh geometry
    Node(NodeGeometry),
}

impl GeometryData {
    /// Kind of this geometry
    pub fn kind(&self) -> GeometryKind {
        match self {
            GeometryData::Image(_) => GeometryKind::Image,
            GeometryData::Node(n) => n.kind,
        }
    }

    /// Image metadata, if this is an image geometry
    pub fn as_image(&self) -> Option<&ImageGeometry> {
        match self {
            GeometryData::Image(image) => Some(image),
            GeometryData::Node(_) => None,
        }
    }

    /// Mesh metadata, if this is a node based geometry
    pub fn as_node(&self) -> Option<&NodeGeometry> {
        match self {
            GeometryData::Node(node) => Some(node),
            GeometryData::Image(_) => None,
        }
    }

    /// Follow a rename of one of the referenced children
    pub fn rename_reference(&mut self, old: &str, new: &str) {
        let rename = |slot: &mut String| {
            if slot == old {
                *slot = new.to_string();
            }
        };
        match self {
            GeometryData::Image(image) => image.cell_data.iter_mut().for_each(rename),
            GeometryData::Node(node) => {
                rename(&mut node.vertex_list);
                node.connectivity.iter_mut().for_each(rename);
                node.element_data.iter_mut().for_each(rename);
            }
        }
    }

    /// Names of children this geometry refers to
    pub fn referenced_children(&self) -> Vec<&str> {
        match self {
            GeometryData::Image(image) => image.cell_data.iter().map(String::as_str).collect(),
            GeometryData::Node(node) => std::iter::once(node.vertex_list.as_str())
                .chain(node.connectivity.as_deref())
                .chain(node.element_data.as_deref())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_per_element() {
        assert_eq!(GeometryKind::Triangle.vertices_per_element(), Some(3));
        assert_eq!(GeometryKind::Hexahedral.vertices_per_element(), Some(8));
        assert!(!GeometryKind::Image.is_node_based());
        assert!(GeometryKind::Edge.is_node_based());
    }

    #[test]
    fn test_image_cells_and_bounds() {
        let image = ImageGeometry {
            dims: [10, 20, 2],
            origin: [0.0, 1.0, 0.0],
            spacing: [0.5, 1.0, 2.0],
            cell_data: Some("Cell Data".to_string()),
        };
        assert_eq!(image.number_of_cells(), 400);
        assert_eq!(image.cell_tuple_shape(), vec![2, 20, 10]);
        assert_eq!(image.max_bounds(), [5.0, 21.0, 4.0]);
    }

    #[test]
    fn test_referenced_children() {
        let geom = GeometryData::Node(NodeGeometry {
            kind: GeometryKind::Triangle,
            vertex_list: "SharedVertexList".to_string(),
            connectivity: Some("SharedTriList".to_string()),
            element_data: None,
        });
        assert_eq!(geom.kind(), GeometryKind::Triangle);
        assert_eq!(
            geom.referenced_children(),
            vec!["SharedVertexList", "SharedTriList"]
        );
    }
}
