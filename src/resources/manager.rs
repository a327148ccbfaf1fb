//! Name-addressed shared resource storage.
//!
//! Resources are immutable once added and handed out as `Arc<T>`. The
//! manager holds one reference itself; [`ResourceManager::unload_unreferenced`]
//! drops every resource nobody else holds anymore.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct ResourceKey;
}

/// Anything stored in a [`ResourceManager`].
pub trait Resource {
    /// Unique name used for lookup.
    fn name(&self) -> &str;
}

// Internal data structure, protected by a lock.
struct ManagerInner<T> {
    map: SlotMap<ResourceKey, Arc<T>>,
    lookup: FxHashMap<String, ResourceKey>,
}

impl<T> Default for ManagerInner<T> {
    fn default() -> Self {
        Self {
            map: SlotMap::default(),
            lookup: FxHashMap::default(),
        }
    }
}

/// Thread-safe name → resource container.
pub struct ResourceManager<T: Resource> {
    inner: RwLock<ManagerInner<T>>,
}

impl<T: Resource> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> std::fmt::Debug for ResourceManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Resource> ResourceManager<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::default(),
        }
    }

    /// [Write] Adds a resource. A resource with the same name is replaced;
    /// holders of the old `Arc` keep their copy.
    pub fn add(&self, resource: impl Into<T>) -> Arc<T> {
        let resource = Arc::new(resource.into());
        let mut guard = self.inner.write();
        let name = resource.name().to_string();
        if let Some(old) = guard.lookup.remove(&name) {
            log::debug!("Replacing resource '{name}'");
            guard.map.remove(old);
        }
        let key = guard.map.insert(Arc::clone(&resource));
        guard.lookup.insert(name, key);
        resource
    }

    /// [Read] Gets a resource by name.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        let guard = self.inner.read();
        let key = guard.lookup.get(name)?;
        guard.map.get(*key).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().lookup.contains_key(name)
    }

    /// [Write] Removes a resource by name, returning it.
    pub fn remove(&self, name: &str) -> Option<Arc<T>> {
        let mut guard = self.inner.write();
        let key = guard.lookup.remove(name)?;
        guard.map.remove(key)
    }

    /// [Write] Drops every resource only the manager still references.
    /// Returns the number of unloaded resources.
    pub fn unload_unreferenced(&self) -> usize {
        let mut guard = self.inner.write();
        let unused: Vec<ResourceKey> = guard
            .map
            .iter()
            .filter(|(_, r)| Arc::strong_count(r) == 1)
            .map(|(key, _)| key)
            .collect();

        for key in &unused {
            if let Some(resource) = guard.map.remove(*key) {
                guard.lookup.remove(resource.name());
                log::debug!("Unloaded unreferenced resource '{}'", resource.name());
            }
        }
        unused.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all stored resources, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.read().lookup.keys().cloned().collect()
    }
}
