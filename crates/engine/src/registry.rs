//! Filter registry
//!
//! Maps filter uuids and names to prototype instances. Callers own the
//! registry and pass it where it is needed; new instances are created by
//! cloning the prototype.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = FilterRegistry::with_core_filters();
//! let filter = registry.create_by_name("create_data_array").unwrap();
//! ```

use crate::filter::Filter;
use crate::filters;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Registry of filter prototypes
pub struct FilterRegistry {
    /// Prototypes by uuid
    filters: FxHashMap<Uuid, Box<dyn Filter>>,
    /// Name → uuid
    names: FxHashMap<&'static str, Uuid>,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        FilterRegistry {
            filters: FxHashMap::default(),
            names: FxHashMap::default(),
        }
    }

    /// Registry holding every filter shipped with this crate
    pub fn with_core_filters() -> Self {
        let mut registry = Self::new();
        for filter in filters::core_filters() {
            registry.register(filter);
        }
        registry
    }

    /// Register a prototype
    ///
    /// Returns the prototype previously registered under the same uuid.
    pub fn register(&mut self, filter: Box<dyn Filter>) -> Option<Box<dyn Filter>> {
        let uuid = filter.uuid();
        let name = filter.name();
        debug!(target: "tessera::registry", name, %uuid, "register filter");
        if let Some(previous) = self.names.insert(name, uuid) {
            if previous != uuid {
                warn!(target: "tessera::registry", name, %previous, %uuid, "filter name now points at a different uuid");
            }
        }
        let replaced = self.filters.insert(uuid, filter);
        if let Some(old) = &replaced {
            if old.name() != name {
                self.names.remove(old.name());
            }
        }
        replaced
    }

    /// Remove a prototype by uuid
    pub fn unregister(&mut self, uuid: &Uuid) -> Option<Box<dyn Filter>> {
        let filter = self.filters.remove(uuid)?;
        if self.names.get(filter.name()) == Some(uuid) {
            self.names.remove(filter.name());
        }
        Some(filter)
    }

    /// New instance of the filter with this uuid
    pub fn create_by_uuid(&self, uuid: &Uuid) -> Option<Box<dyn Filter>> {
        self.filters.get(uuid).map(|f| f.clone_filter())
    }

    /// New instance of the filter with this machine name
    pub fn create_by_name(&self, name: &str) -> Option<Box<dyn Filter>> {
        self.names
            .get(name)
            .and_then(|uuid| self.create_by_uuid(uuid))
    }

    /// True if a filter with this uuid is registered
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.filters.contains_key(uuid)
    }

    /// `(name, uuid)` of every registered filter, sorted by name
    pub fn list(&self) -> Vec<(&'static str, Uuid)> {
        let mut list: Vec<_> = self.filters.values().map(|f| (f.name(), f.uuid())).collect();
        list.sort();
        list
    }

    /// Number of registered filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filter_count", &self.filters.len())
            .field("names", &self.list().iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .finish()
    }
}
