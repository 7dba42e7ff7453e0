//! The data graph
//!
//! [`DataStructure`] owns every object of one pipeline run in a single table
//! keyed by [`DataId`]. That table is the only owner: an object lives until
//! it is erased from it. Containers (and the root) hold name → id links that
//! are used only to resolve [`DataPath`]s. An object may be linked under
//! several containers at once.
//!
//! # Invariants
//!
//! - No two children of one container share a name.
//! - Every id named by a child map exists in the owning table.
//! - A link key always equals the linked object's name.
//! - An attribute matrix only holds arrays whose tuple shape equals its own.
//! - The link structure is acyclic.
//!
//! All mutating methods take `&mut self`; only the pipeline driver holds the
//! graph mutably, so structural changes never race with worker threads.

use crate::geometry::GeometryData;
use crate::object::{ChildMap, DataObject};
use crate::store::{AnyDataStore, DataStore, StoreElement};
use rustc_hash::FxHashMap;
use tessera_core::{DataId, DataPath, DataType, Error, Result, Shape};
use tracing::debug;

/// Owning table of all objects plus the root links
#[derive(Debug, Clone, Default)]
pub struct DataStructure {
    objects: FxHashMap<DataId, DataObject>,
    root: ChildMap,
}

impl DataStructure {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in the owning table
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the graph holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Copy of the graph with every array reduced to its metadata
    ///
    /// Ids and links are preserved, so paths resolve to the same ids as in
    /// `self`. Used to dry-run a pipeline without allocating buffers.
    pub fn preflight_copy(&self) -> DataStructure {
        DataStructure {
            objects: self
                .objects
                .iter()
                .map(|(id, object)| (*id, object.metadata_only()))
                .collect(),
            root: self.root.clone(),
        }
    }

    /// Look up an object by id
    pub fn get(&self, id: DataId) -> Option<&DataObject> {
        self.objects.get(&id)
    }

    /// True if the id is in the owning table
    pub fn contains_id(&self, id: DataId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Links at the top level of the graph
    pub fn top_level(&self) -> &ChildMap {
        &self.root
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    /// Resolve a path to an id, following only existing links
    pub fn resolve(&self, path: &DataPath) -> Result<DataId> {
        if path.is_root() {
            return Err(Error::invalid_path("", "the root is not an object"));
        }
        let not_found = || Error::NotFound(path.clone());
        let mut children = &self.root;
        let mut segments = path.segments().iter().peekable();
        while let Some(segment) = segments.next() {
            let id = *children.get(segment).ok_or_else(not_found)?;
            let object = self.objects.get(&id).ok_or_else(not_found)?;
            if segments.peek().is_none() {
                return Ok(id);
            }
            children = object.children().ok_or_else(not_found)?;
        }
        Err(not_found())
    }

    /// True if the path resolves
    pub fn contains(&self, path: &DataPath) -> bool {
        self.resolve(path).is_ok()
    }

    /// Object at a path
    pub fn get_by_path(&self, path: &DataPath) -> Result<&DataObject> {
        let id = self.resolve(path)?;
        self.objects.get(&id).ok_or(Error::IdNotFound(id))
    }

    fn get_mut_by_path(&mut self, path: &DataPath) -> Result<&mut DataObject> {
        let id = self.resolve(path)?;
        self.objects.get_mut(&id).ok_or(Error::IdNotFound(id))
    }

    fn child_map(&self, parent: &DataPath) -> Result<&ChildMap> {
        if parent.is_root() {
            return Ok(&self.root);
        }
        self.get_by_path(parent)?
            .children()
            .ok_or_else(|| Error::NotAContainer(parent.clone()))
    }

    fn child_map_mut(&mut self, parent: &DataPath) -> Result<&mut ChildMap> {
        if parent.is_root() {
            return Ok(&mut self.root);
        }
        self.get_mut_by_path(parent)?
            .children_mut()
            .ok_or_else(|| Error::NotAContainer(parent.clone()))
    }

    /// Paths of the direct children of a container
    pub fn get_children(&self, parent: &DataPath) -> Result<Vec<DataPath>> {
        self.child_map(parent)?
            .keys()
            .map(|name| parent.create_child_path(name.clone()))
            .collect()
    }

    /// Every path that resolves, depth first in name order
    ///
    /// An object linked under several containers appears once per path.
    pub fn get_all_paths(&self) -> Vec<DataPath> {
        let mut paths = Vec::new();
        self.walk(|path, _| paths.push(path.clone()));
        paths
    }

    /// Every path that resolves to `id`
    pub fn paths_of(&self, id: DataId) -> Vec<DataPath> {
        let mut paths = Vec::new();
        self.walk(|path, found| {
            if found == id {
                paths.push(path.clone());
            }
        });
        paths
    }

    /// Paths of every container that links `id`
    pub fn get_parents(&self, id: DataId) -> Vec<DataPath> {
        self.paths_of(id).iter().map(DataPath::get_parent).collect()
    }

    fn walk(&self, mut visit: impl FnMut(&DataPath, DataId)) {
        let mut stack: Vec<(DataPath, DataId)> = Vec::new();
        for (name, id) in self.root.iter().rev() {
            if let Ok(path) = DataPath::root().create_child_path(name.clone()) {
                stack.push((path, *id));
            }
        }
        while let Some((path, id)) = stack.pop() {
            let Some(object) = self.objects.get(&id) else {
                continue;
            };
            visit(&path, id);
            if let Some(children) = object.children() {
                for (name, child) in children.iter().rev() {
                    if let Ok(child_path) = path.create_child_path(name.clone()) {
                        stack.push((child_path, *child));
                    }
                }
            }
        }
    }

    // ========================================================================
    // Insertion and linking
    // ========================================================================

    fn check_can_link(&self, object: &DataObject, parent: &DataPath) -> Result<()> {
        if !parent.is_root() {
            let container = self
                .get_by_path(parent)
                .map_err(|_| Error::ParentNotFound(parent.clone()))?;
            if container.children().is_none() {
                return Err(Error::NotAContainer(parent.clone()));
            }
            if let Some(required) = container.required_tuple_shape() {
                let Some(store) = object.store() else {
                    return Err(Error::WrongObjectType {
                        path: parent.clone(),
                        expected: "DataArray",
                        actual: object.object_type().name(),
                    });
                };
                if store.tuple_shape() != required {
                    return Err(Error::ShapeMismatch {
                        expected: required.to_vec(),
                        actual: store.tuple_shape().to_vec(),
                    });
                }
            }
        }
        if self.child_map(parent)?.contains_key(object.name()) {
            return Err(Error::DuplicateName {
                parent: parent.clone(),
                name: object.name().to_string(),
            });
        }
        Ok(())
    }

    /// Insert an unlinked object under `parent`
    ///
    /// Fails with `DuplicateName` if a sibling already uses the object's name,
    /// `ParentNotFound` if the parent does not resolve and `NotAContainer` if
    /// the parent cannot hold children.
    pub fn insert(&mut self, object: DataObject, parent: &DataPath) -> Result<DataId> {
        let id = object.id();
        if self.objects.contains_key(&id) {
            return Err(Error::IdInUse(id));
        }
        self.check_can_link(&object, parent)?;
        self.child_map_mut(parent)?
            .insert(object.name().to_string(), id);
        debug!(target: "tessera::graph", %id, name = object.name(), %parent, "insert");
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Create a group under `parent`
    pub fn create_group(&mut self, name: impl Into<String>, parent: &DataPath) -> Result<DataId> {
        self.insert(DataObject::group(name), parent)
    }

    /// Create an attribute matrix under `parent`
    pub fn create_attribute_matrix(
        &mut self,
        name: impl Into<String>,
        parent: &DataPath,
        tuple_shape: Shape,
    ) -> Result<DataId> {
        self.insert(DataObject::attribute_matrix(name, tuple_shape), parent)
    }

    /// Create a geometry container under `parent`
    pub fn create_geometry(
        &mut self,
        name: impl Into<String>,
        parent: &DataPath,
        geometry: GeometryData,
    ) -> Result<DataId> {
        self.insert(DataObject::geometry(name, geometry), parent)
    }

    /// Create a zero-filled array under `parent`
    pub fn create_data_array(
        &mut self,
        parent: &DataPath,
        name: impl Into<String>,
        data_type: DataType,
        tuple_shape: Shape,
        component_shape: Shape,
    ) -> Result<DataId> {
        let store = AnyDataStore::allocate(data_type, tuple_shape, component_shape);
        self.insert(DataObject::data_array(name, store), parent)
    }

    /// Create an array under `parent` from an existing store
    pub fn create_data_array_with(
        &mut self,
        parent: &DataPath,
        name: impl Into<String>,
        store: impl Into<AnyDataStore>,
    ) -> Result<DataId> {
        self.insert(DataObject::data_array(name, store.into()), parent)
    }

    /// Link an existing object under another container as well
    pub fn add_link(&mut self, path: &DataPath, parent: &DataPath) -> Result<()> {
        let id = self.resolve(path)?;
        if !parent.is_root() {
            let parent_id = self
                .resolve(parent)
                .map_err(|_| Error::ParentNotFound(parent.clone()))?;
            if self.subtree_contains(id, parent_id) {
                return Err(Error::CycleDetected {
                    object: path.clone(),
                    parent: parent.clone(),
                });
            }
        }
        let object = self.objects.get(&id).ok_or(Error::IdNotFound(id))?;
        self.check_can_link(object, parent)?;
        let name = object.name().to_string();
        self.child_map_mut(parent)?.insert(name, id);
        Ok(())
    }

    /// Remove one link
    ///
    /// The object stays in the owning table even when this was its last
    /// link; only [`erase`](Self::erase) destroys objects. Objects left
    /// without links are listed by [`unlinked_ids`](Self::unlinked_ids).
    pub fn remove_link(&mut self, path: &DataPath) -> Result<DataId> {
        let id = self.resolve(path)?;
        let name = path.target_name().unwrap_or_default().to_string();
        self.child_map_mut(&path.get_parent())?.remove(&name);
        debug!(target: "tessera::graph", %path, %id, linked = self.is_linked(id), "remove link");
        Ok(id)
    }

    /// Ids of objects no container or root entry links
    pub fn unlinked_ids(&self) -> Vec<DataId> {
        let mut ids: Vec<DataId> = self
            .objects
            .keys()
            .copied()
            .filter(|id| !self.is_linked(*id))
            .collect();
        ids.sort();
        ids
    }

    fn subtree_contains(&self, root: DataId, target: DataId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if let Some(children) = self.objects.get(&id).and_then(DataObject::children) {
                stack.extend(children.values().copied());
            }
        }
        false
    }

    fn is_linked(&self, id: DataId) -> bool {
        self.root.values().any(|c| *c == id)
            || self
                .objects
                .values()
                .filter_map(DataObject::children)
                .any(|children| children.values().any(|c| *c == id))
    }

    // ========================================================================
    // Erase
    // ========================================================================

    /// Erase an object from the owning table
    ///
    /// Removal is unconditional: every link naming the object is dropped at
    /// once. Children reachable only through the erased object are erased
    /// with it; children still linked elsewhere survive.
    pub fn erase(&mut self, id: DataId) -> Result<()> {
        if !self.objects.contains_key(&id) {
            return Err(Error::IdNotFound(id));
        }
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(object) = self.objects.remove(&id) else {
                continue;
            };
            self.unlink_everywhere(id);
            debug!(target: "tessera::graph", %id, name = object.name(), "erase");
            if let Some(children) = object.children() {
                for child in children.values() {
                    if self.objects.contains_key(child) && !self.is_linked(*child) {
                        pending.push(*child);
                    }
                }
            }
        }
        Ok(())
    }

    fn unlink_everywhere(&mut self, id: DataId) {
        self.root.retain(|_, child| *child != id);
        for object in self.objects.values_mut() {
            if let Some(children) = object.children_mut() {
                children.retain(|_, child| *child != id);
            }
        }
    }

    // ========================================================================
    // Rename and move
    // ========================================================================

    /// Rename an object in every container that links it
    pub fn rename(&mut self, path: &DataPath, new_name: &str) -> Result<()> {
        path.replace_name(new_name)?;
        let id = self.resolve(path)?;
        let old_name = self
            .objects
            .get(&id)
            .ok_or(Error::IdNotFound(id))?
            .name()
            .to_string();
        if old_name == new_name {
            return Ok(());
        }

        let mut linking: Vec<Option<DataId>> = Vec::new();
        if self.root.get(&old_name) == Some(&id) {
            linking.push(None);
        }
        for (parent_id, object) in &self.objects {
            if object.children().and_then(|c| c.get(&old_name)) == Some(&id) {
                linking.push(Some(*parent_id));
            }
        }
        for parent in &linking {
            let children = match parent {
                None => &self.root,
                Some(pid) => self
                    .objects
                    .get(pid)
                    .and_then(DataObject::children)
                    .ok_or(Error::IdNotFound(*pid))?,
            };
            if children.contains_key(new_name) {
                let parent_path = match parent {
                    None => DataPath::root(),
                    Some(pid) => self.paths_of(*pid).into_iter().next().unwrap_or_default(),
                };
                return Err(Error::DuplicateName {
                    parent: parent_path,
                    name: new_name.to_string(),
                });
            }
        }

        for parent in linking {
            let container = match parent {
                None => {
                    self.root.remove(&old_name);
                    self.root.insert(new_name.to_string(), id);
                    continue;
                }
                Some(pid) => self.objects.get_mut(&pid).ok_or(Error::IdNotFound(pid))?,
            };
            if let Some(children) = container.children_mut() {
                children.remove(&old_name);
                children.insert(new_name.to_string(), id);
            }
            if let Some(geometry) = container.geometry_data_mut() {
                geometry.rename_reference(&old_name, new_name);
            }
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.set_name(new_name.to_string());
        }
        debug!(target: "tessera::graph", %id, %old_name, new_name, "rename");
        Ok(())
    }

    /// Move the link at `path` under `new_parent`
    pub fn move_object(&mut self, path: &DataPath, new_parent: &DataPath) -> Result<()> {
        let old_parent = path.get_parent();
        if &old_parent == new_parent {
            return Ok(());
        }
        self.add_link(path, new_parent)?;
        let name = path.target_name().unwrap_or_default().to_string();
        self.child_map_mut(&old_parent)?.remove(&name);
        Ok(())
    }

    // ========================================================================
    // Copy
    // ========================================================================

    /// Recursively duplicate the subgraph at `source` and insert it at `dest`
    ///
    /// Every duplicated object gets a fresh id, so the copy shares no ids (and
    /// no buffers) with the source. The last segment of `dest` names the copy.
    pub fn deep_copy(&mut self, source: &DataPath, dest: &DataPath) -> Result<DataId> {
        let source_id = self.resolve(source)?;
        let new_name = dest
            .target_name()
            .ok_or_else(|| Error::invalid_path("", "cannot copy onto the root"))?
            .to_string();
        if self.contains(dest) {
            return Err(Error::DestinationExists(dest.clone()));
        }
        let dest_parent = dest.get_parent();
        if !dest_parent.is_root() {
            let parent_id = self
                .resolve(&dest_parent)
                .map_err(|_| Error::ParentNotFound(dest_parent.clone()))?;
            if self.subtree_contains(source_id, parent_id) {
                return Err(Error::CycleDetected {
                    object: source.clone(),
                    parent: dest_parent,
                });
            }
        }

        let (copy_id, created) = self.copy_subtree(source_id, new_name)?;
        let root_copy = created.last().ok_or(Error::IdNotFound(source_id))?;
        self.check_can_link(root_copy, &dest_parent)?;
        let name = root_copy.name().to_string();
        let count = created.len();
        for object in created {
            self.objects.insert(object.id(), object);
        }
        self.child_map_mut(&dest_parent)?.insert(name, copy_id);
        debug!(target: "tessera::graph", %source, %dest, objects = count, "deep copy");
        Ok(copy_id)
    }

    /// Copies come back children first, the copy of `id` last
    fn copy_subtree(&self, id: DataId, name: String) -> Result<(DataId, Vec<DataObject>)> {
        let original = self.objects.get(&id).ok_or(Error::IdNotFound(id))?;
        let mut copy = original.duplicate_linked(name);
        let mut created = Vec::new();
        if let Some(children) = copy.children_mut() {
            for (child_name, child_id) in children.iter_mut() {
                let (new_child, mut objects) = self.copy_subtree(*child_id, child_name.clone())?;
                *child_id = new_child;
                created.append(&mut objects);
            }
        }
        let copy_id = copy.id();
        created.push(copy);
        Ok((copy_id, created))
    }

    /// Detached duplicate of one object, without its children
    ///
    /// The caller decides where to insert it; inserting next to the original
    /// fails with `DuplicateName`.
    pub fn shallow_copy(&self, source: &DataPath) -> Result<DataObject> {
        Ok(self.get_by_path(source)?.duplicate_detached())
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Untyped view of an array
    pub fn get_data_array(&self, path: &DataPath) -> Result<&AnyDataStore> {
        let object = self.get_by_path(path)?;
        object.store().ok_or_else(|| Error::WrongObjectType {
            path: path.clone(),
            expected: "DataArray",
            actual: object.object_type().name(),
        })
    }

    /// Untyped mutable view of an array
    pub fn get_data_array_mut(&mut self, path: &DataPath) -> Result<&mut AnyDataStore> {
        let object = self.get_mut_by_path(path)?;
        let actual = object.object_type().name();
        object.store_mut().ok_or_else(|| Error::WrongObjectType {
            path: path.clone(),
            expected: "DataArray",
            actual,
        })
    }

    /// Typed view of an array; `TypeMismatch` if the kind differs
    pub fn get_array<T: StoreElement>(&self, path: &DataPath) -> Result<&DataStore<T>> {
        self.get_data_array(path)?
            .typed::<T>()
            .map_err(|e| with_path(e, path))
    }

    /// Typed mutable view of an array
    pub fn get_array_mut<T: StoreElement>(&mut self, path: &DataPath) -> Result<&mut DataStore<T>> {
        self.get_data_array_mut(path)?
            .typed_mut::<T>()
            .map_err(|e| with_path(e, path))
    }

    /// Write one array while reading the rest of the graph
    ///
    /// The array's object is taken out of the owning table for the duration
    /// of `f`, so `f` sees the graph without it and owns the only mutable
    /// handle to its buffer.
    pub fn split_array_mut<T, R>(
        &mut self,
        path: &DataPath,
        f: impl FnOnce(&DataStructure, &mut DataStore<T>) -> R,
    ) -> Result<R>
    where
        T: StoreElement,
    {
        self.get_array::<T>(path)?;
        let id = self.resolve(path)?;
        let mut object = self.objects.remove(&id).ok_or(Error::IdNotFound(id))?;
        let result = match object.store_mut().map(AnyDataStore::typed_mut::<T>) {
            Some(Ok(store)) => Ok(f(self, store)),
            Some(Err(e)) => Err(with_path(e, path)),
            None => Err(Error::IdNotFound(id)),
        };
        self.objects.insert(id, object);
        result
    }

    /// Change the tuple shape of an array or an attribute matrix
    ///
    /// Resizing an attribute matrix resizes every array it links. An array
    /// linked under an attribute matrix can only be resized through it.
    pub fn resize_array(&mut self, id: DataId, tuple_shape: Shape) -> Result<()> {
        let object = self.objects.get(&id).ok_or(Error::IdNotFound(id))?;
        if object.store().is_some() {
            let constrained = self.objects.values().find(|o| {
                o.required_tuple_shape().is_some()
                    && o.children().map_or(false, |c| c.values().any(|c| *c == id))
            });
            if let Some(matrix) = constrained {
                let required = matrix.required_tuple_shape().unwrap_or_default();
                if required != tuple_shape.as_slice() {
                    return Err(Error::ShapeMismatch {
                        expected: required.to_vec(),
                        actual: tuple_shape,
                    });
                }
            }
            if let Some(store) = self.objects.get_mut(&id).and_then(DataObject::store_mut) {
                store.resize_tuples(tuple_shape);
            }
            return Ok(());
        }

        let Some(children) = object.children().cloned() else {
            return Ok(());
        };
        if object.required_tuple_shape().is_none() {
            return Err(Error::WrongObjectType {
                path: self.paths_of(id).into_iter().next().unwrap_or_default(),
                expected: "AttributeMatrix or DataArray",
                actual: object.object_type().name(),
            });
        }
        for child in children.values() {
            if let Some(store) = self.objects.get_mut(child).and_then(DataObject::store_mut) {
                store.resize_tuples(tuple_shape.clone());
            }
        }
        if let Some(object) = self.objects.get_mut(&id) {
            if let crate::object::DataObjectKind::AttributeMatrix {
                tuple_shape: shape, ..
            } = object.kind_mut()
            {
                *shape = tuple_shape;
            }
        }
        Ok(())
    }

    /// Geometry metadata of the geometry at `path`
    pub fn get_geometry(&self, path: &DataPath) -> Result<&GeometryData> {
        let object = self.get_by_path(path)?;
        object.geometry_data().ok_or_else(|| Error::WrongObjectType {
            path: path.clone(),
            expected: "Geometry",
            actual: object.object_type().name(),
        })
    }

    /// Tuple shape of the attribute matrix at `path`
    pub fn get_attribute_matrix_shape(&self, path: &DataPath) -> Result<&[usize]> {
        let object = self.get_by_path(path)?;
        object
            .required_tuple_shape()
            .ok_or_else(|| Error::WrongObjectType {
                path: path.clone(),
                expected: "AttributeMatrix",
                actual: object.object_type().name(),
            })
    }

    /// Check the link invariants; used by tests and debug assertions
    pub fn check_integrity(&self) -> Result<()> {
        let check = |children: &ChildMap, parent: DataPath| -> Result<()> {
            for (name, id) in children {
                let object = self.objects.get(id).ok_or(Error::IdNotFound(*id))?;
                if object.name() != name {
                    return Err(Error::invalid_path(
                        parent.create_child_path(name.clone())?.to_string(),
                        format!("link name differs from object name '{}'", object.name()),
                    ));
                }
            }
            Ok(())
        };
        check(&self.root, DataPath::root())?;
        for object in self.objects.values() {
            if let Some(children) = object.children() {
                check(children, DataPath::root())?;
            }
        }
        Ok(())
    }
}

fn with_path(error: Error, path: &DataPath) -> Error {
    match error {
        Error::NotAllocated(_) => Error::NotAllocated(path.clone()),
        other => other,
    }
}
