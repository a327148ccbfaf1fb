use rustc_hash::FxHashMap;

use crate::errors::{MeshError, Result};
use crate::mesh::animation_manager::{BasicMeshAnimationManager, MeshAnimationManager};
use crate::mesh::software::SoftwareMeshAnimationManager;
use crate::settings::{AnimationSettings, SkinningBackend};

/// Builds a mesh animation manager.
pub type ManagerConstructor = fn(AnimationSettings) -> Box<dyn MeshAnimationManager>;

/// Maps string keys to mesh animation manager constructors.
///
/// Set up once, then shared read-only by every mesh handler that creates a
/// manager by key.
#[derive(Debug, Clone, Default)]
pub struct AnimationManagerRegistry {
    constructors: FxHashMap<String, ManagerConstructor>,
}

impl AnimationManagerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies of every [`SkinningBackend`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(SkinningBackend::JointStatesOnly.key(), |settings| {
                Box::new(BasicMeshAnimationManager::new(settings))
            })
            .with(SkinningBackend::Software.key(), |settings| {
                Box::new(SoftwareMeshAnimationManager::new(settings))
            })
    }

    #[must_use]
    pub fn with(mut self, key: &str, constructor: ManagerConstructor) -> Self {
        self.register(key, constructor);
        self
    }

    /// Registers `constructor` under `key`, replacing an earlier one.
    pub fn register(&mut self, key: &str, constructor: ManagerConstructor) {
        if self.constructors.insert(key.to_string(), constructor).is_some() {
            log::debug!("Replaced mesh animation manager '{key}'");
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn create(&self, key: &str, settings: AnimationSettings) -> Result<Box<dyn MeshAnimationManager>> {
        let constructor = self
            .constructors
            .get(key)
            .ok_or_else(|| MeshError::UnknownAnimationManager(key.to_string()))?;
        Ok(constructor(settings))
    }

    /// Creates the manager of a backend.
    pub fn create_backend(
        &self,
        backend: SkinningBackend,
        settings: AnimationSettings,
    ) -> Result<Box<dyn MeshAnimationManager>> {
        self.create(backend.key(), settings)
    }
}
