use std::sync::Arc;

use crate::animation::AnimationInfo;
use crate::errors::{MeshError, Result};
use crate::mesh::animation_manager::MeshAnimationManager;
use crate::mesh::registry::AnimationManagerRegistry;
use crate::resources::{BoundingBox, Mesh, VertexBufferRef};
use crate::settings::AnimationSettings;
use crate::skeleton::{JointHandler, SkeletonHandler};

/// Per-instance animation state of a shared [`Mesh`].
///
/// Owns the skeleton handler (for meshes with a skeleton), the morph target
/// weights and an optional mesh animation manager. Once the manager reports
/// a change, the handler duplicates the base vertex buffer and lets the
/// manager write the animated vertices into that private copy.
///
/// ```rust,ignore
/// let mut handler = MeshHandler::with_mesh(mesh)?;
/// handler.create_mesh_animation_manager(&registry, "software")?;
/// handler.start_animation("walk", true)?;
///
/// // every frame
/// handler.update(dt, 0)?;
/// let vertices = handler.vertex_buffer();
/// ```
#[derive(Debug, Default)]
pub struct MeshHandler {
    mesh: Option<Arc<Mesh>>,
    skeleton_handler: Option<SkeletonHandler>,
    animation_manager: Option<Box<dyn MeshAnimationManager>>,

    base_morph_target_weights: Vec<f32>,
    morph_target_weights: Vec<f32>,

    /// Private animated copy of the base vertex buffer
    vertex_buffer: Option<VertexBufferRef>,
    /// Buffer consumers should read from: the private copy or the base
    current_vertex_buffer: Option<VertexBufferRef>,

    mesh_update_required: bool,
    lod_level: u32,
}

impl MeshHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mesh: Arc<Mesh>) -> Result<Self> {
        let mut handler = Self::new();
        handler.set_mesh(Some(mesh))?;
        Ok(handler)
    }

    // ========================================================================
    // Mesh
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Binds a mesh (or unbinds with `None`).
    ///
    /// Drops the private vertex buffer, zeroes the morph target weights,
    /// rebuilds the skeleton handler and clears the animations of the
    /// animation manager before running one update.
    pub fn set_mesh(&mut self, mesh: Option<Arc<Mesh>>) -> Result<()> {
        self.mesh = mesh;
        self.vertex_buffer = None;
        self.current_vertex_buffer = None;

        let num_morph_targets = self.mesh.as_ref().map_or(0, |mesh| mesh.num_morph_targets());
        self.base_morph_target_weights = vec![0.0; num_morph_targets];
        self.morph_target_weights = vec![0.0; num_morph_targets];

        match self.mesh.as_ref().and_then(|mesh| mesh.skeleton()) {
            Some(skeleton) => self
                .skeleton_handler
                .get_or_insert_with(SkeletonHandler::new)
                .set_resource(Some(Arc::clone(skeleton))),
            None => self.skeleton_handler = None,
        }

        if let Some(manager) = self.animation_manager.as_mut() {
            manager.state_mut().clear();
        }
        self.update(0.0, self.lod_level)
    }

    #[inline]
    #[must_use]
    pub fn skeleton_handler(&self) -> Option<&SkeletonHandler> {
        self.skeleton_handler.as_ref()
    }

    #[inline]
    pub fn skeleton_handler_mut(&mut self) -> Option<&mut SkeletonHandler> {
        self.skeleton_handler.as_mut()
    }

    // ========================================================================
    // Morph Target Weights
    // ========================================================================

    /// Weights the current weights are reset to every frame, one per morph
    /// target.
    #[must_use]
    pub fn base_morph_target_weights(&self) -> &[f32] {
        &self.base_morph_target_weights
    }

    pub fn base_morph_target_weights_mut(&mut self) -> &mut [f32] {
        &mut self.base_morph_target_weights
    }

    /// Weights used for skinning, one per morph target.
    #[must_use]
    pub fn morph_target_weights(&self) -> &[f32] {
        &self.morph_target_weights
    }

    pub fn morph_target_weights_mut(&mut self) -> &mut [f32] {
        &mut self.morph_target_weights
    }

    pub fn reset_morph_target_weights(&mut self) {
        self.morph_target_weights.clone_from(&self.base_morph_target_weights);
    }

    // ========================================================================
    // Animation Manager
    // ========================================================================

    #[must_use]
    pub fn animation_manager(&self) -> Option<&dyn MeshAnimationManager> {
        self.animation_manager.as_deref()
    }

    pub fn animation_manager_mut(&mut self) -> Option<&mut (dyn MeshAnimationManager + 'static)> {
        self.animation_manager.as_deref_mut()
    }

    /// Installs `manager`, dropping the previous one.
    pub fn set_animation_manager(&mut self, manager: Option<Box<dyn MeshAnimationManager>>) {
        self.animation_manager = manager;
    }

    /// Replaces the animation manager with a new one built by `registry`.
    ///
    /// The previous manager is always dropped. An empty key only drops it.
    pub fn create_mesh_animation_manager(
        &mut self,
        registry: &AnimationManagerRegistry,
        key: &str,
    ) -> Result<()> {
        self.animation_manager = None;
        if key.is_empty() {
            return Ok(());
        }
        self.animation_manager = Some(registry.create(key, AnimationSettings::default())?);
        Ok(())
    }

    /// Starts the named skeleton or morph target animation on the animation
    /// manager.
    pub fn start_animation(&mut self, name: &str, restart: bool) -> Result<()> {
        let info = self
            .animation_info(name)
            .ok_or_else(|| MeshError::MissingAnimation(name.to_string()))?;
        let manager = self
            .animation_manager
            .as_mut()
            .ok_or(MeshError::MissingAnimationManager)?;
        manager.state_mut().start(&info, restart);
        self.mesh_update_required = true;
        Ok(())
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Marks the vertex data as outdated, forcing the next update to apply
    /// the animation manager.
    pub fn mesh_update_required(&mut self) {
        self.mesh_update_required = true;
    }

    #[inline]
    #[must_use]
    pub fn is_mesh_update_required(&self) -> bool {
        self.mesh_update_required
    }

    #[inline]
    #[must_use]
    pub fn lod_level(&self) -> u32 {
        self.lod_level
    }

    /// Advances the animations and, if anything changed, re-applies the
    /// animation manager.
    ///
    /// A failed apply is logged and returned. The update is still complete:
    /// the dirty flag is cleared and the private buffer keeps the previous
    /// frame's vertices.
    pub fn update(&mut self, dt: f32, lod_level: u32) -> Result<()> {
        let Some(mesh) = self.mesh.clone() else {
            return Ok(());
        };

        if let Some(manager) = self.animation_manager.as_mut()
            && manager.update(dt)
        {
            self.mesh_update_required = true;
        }
        self.lod_level = lod_level;

        let mut result = Ok(());
        if self.mesh_update_required
            && self.animation_manager.is_some()
            && self.vertex_buffer.is_none()
            && let Some(base) = mesh.base_vertex_buffer()
        {
            match base.duplicate(&format!("{}_animated", mesh.name())) {
                Ok(buffer) => self.vertex_buffer = Some(buffer),
                Err(err) => result = Err(err),
            }
        }

        if let Some(buffer) = &self.vertex_buffer {
            self.current_vertex_buffer = Some(buffer.clone());
            if self.mesh_update_required
                && let Some(manager) = self.animation_manager.take()
            {
                let applied = manager.apply(self);
                self.animation_manager = Some(manager);
                result = applied;
            }
        } else {
            self.current_vertex_buffer = mesh.base_vertex_buffer().cloned();
        }
        self.mesh_update_required = false;

        if let Err(err) = &result {
            log::warn!("Mesh '{}' update skipped: {err}", mesh.name());
        }
        result
    }

    // ========================================================================
    // Vertex Data
    // ========================================================================

    /// Buffer holding the vertices to draw: the animated private copy if one
    /// exists, the base morph target's buffer otherwise.
    #[inline]
    #[must_use]
    pub fn vertex_buffer(&self) -> Option<&VertexBufferRef> {
        self.current_vertex_buffer.as_ref()
    }

    /// Replaces the private destination buffer that skinning writes into.
    pub fn set_vertex_buffer(&mut self, buffer: Option<VertexBufferRef>) {
        self.current_vertex_buffer.clone_from(&buffer);
        self.vertex_buffer = buffer;
    }

    // ========================================================================
    // Lookup Helpers
    // ========================================================================

    #[must_use]
    pub fn joint_handler(&self, name: &str) -> Option<&JointHandler> {
        self.skeleton_handler.as_ref()?.joint_handler(name)
    }

    pub fn joint_handler_mut(&mut self, name: &str) -> Option<&mut JointHandler> {
        self.skeleton_handler.as_mut()?.joint_handler_mut(name)
    }

    #[must_use]
    pub fn base_joint_handler(&self, name: &str) -> Option<&JointHandler> {
        self.skeleton_handler.as_ref()?.base_joint_handler(name)
    }

    pub fn base_joint_handler_mut(&mut self, name: &str) -> Option<&mut JointHandler> {
        self.skeleton_handler.as_mut()?.base_joint_handler_mut(name)
    }

    /// Names of all animations the mesh can play.
    #[must_use]
    pub fn animations_list(&self) -> Vec<String> {
        self.mesh.as_ref().map(|mesh| mesh.animation_names()).unwrap_or_default()
    }

    #[must_use]
    pub fn animation_info(&self, name: &str) -> Option<AnimationInfo> {
        let mesh = self.mesh.as_ref()?;
        let info = mesh.animation_info(name);
        if info.is_none() {
            log::warn!("Can't find animation '{name}' for mesh '{}'", mesh.name());
        }
        info
    }

    /// Box around the absolute translations of all joints of the current
    /// pose.
    #[must_use]
    pub fn calculate_joint_bounding_box(&self) -> Option<BoundingBox> {
        let handlers = self.skeleton_handler.as_ref()?.joint_handlers();
        BoundingBox::from_points(handlers.iter().map(JointHandler::translation_absolute))
    }
}
