use std::sync::Arc;

use crate::animation::info::AnimationInfo;
use crate::animation::morph_target_ani::MorphTargetAniManager;
use crate::errors::Result;
use crate::resources::buffer::VertexBufferRef;
use crate::resources::morph_target::MeshMorphTarget;
use crate::resources::weight::{self, VertexWeights, Weight};
use crate::settings::WeightValidation;
use crate::skeleton::{Skeleton, SkeletonManager};

/// Shared mesh data consumed by mesh handlers.
///
/// Morph target 0 is the base vertex set. Skeleton animations are resolved
/// by name through the skeleton manager, morph target animations through the
/// morph target animation manager. Both managers may be shared between
/// meshes.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    morph_targets: Vec<MeshMorphTarget>,
    weights: Vec<Weight>,
    vertex_weights: Vec<VertexWeights>,
    skeleton: Option<Arc<Skeleton>>,
    skeleton_manager: Arc<SkeletonManager>,
    morph_target_animations: Arc<MorphTargetAniManager>,
}

impl Mesh {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            morph_targets: Vec::new(),
            weights: Vec::new(),
            vertex_weights: Vec::new(),
            skeleton: None,
            skeleton_manager: Arc::default(),
            morph_target_animations: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_skeleton_manager(mut self, manager: Arc<SkeletonManager>) -> Self {
        self.skeleton_manager = manager;
        self
    }

    #[must_use]
    pub fn with_morph_target_animations(mut self, manager: Arc<MorphTargetAniManager>) -> Self {
        self.morph_target_animations = manager;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Morph Targets
    // ========================================================================

    /// Appends a morph target and returns its index. The first target added
    /// is the base.
    pub fn add_morph_target(&mut self, morph_target: MeshMorphTarget) -> usize {
        self.morph_targets.push(morph_target);
        self.morph_targets.len() - 1
    }

    #[must_use]
    pub fn morph_targets(&self) -> &[MeshMorphTarget] {
        &self.morph_targets
    }

    #[must_use]
    pub fn num_morph_targets(&self) -> usize {
        self.morph_targets.len()
    }

    #[must_use]
    pub fn morph_target(&self, index: usize) -> Option<&MeshMorphTarget> {
        self.morph_targets.get(index)
    }

    #[must_use]
    pub fn morph_target_index(&self, name: &str) -> Option<usize> {
        self.morph_targets.iter().position(|target| target.name == name)
    }

    /// Vertex buffer of the base morph target.
    #[must_use]
    pub fn base_vertex_buffer(&self) -> Option<&VertexBufferRef> {
        self.morph_targets.first()?.vertex_buffer.as_ref()
    }

    // ========================================================================
    // Skinning Data
    // ========================================================================

    pub fn set_skeleton(&mut self, skeleton: Option<Arc<Skeleton>>) {
        self.skeleton = skeleton;
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    /// Replaces the weight list and the per-vertex weight indices.
    pub fn set_weights(&mut self, weights: Vec<Weight>, vertex_weights: Vec<VertexWeights>) {
        self.weights = weights;
        self.vertex_weights = vertex_weights;
    }

    #[must_use]
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    #[must_use]
    pub fn vertex_weights(&self) -> &[VertexWeights] {
        &self.vertex_weights
    }

    /// Checks the bias sums of all vertices, see
    /// [`validate_vertex_weights`](weight::validate_vertex_weights).
    pub fn validate_vertex_weights(&mut self, policy: WeightValidation) -> Result<usize> {
        weight::validate_vertex_weights(&mut self.weights, &mut self.vertex_weights, policy)
    }

    // ========================================================================
    // Animations
    // ========================================================================

    #[must_use]
    pub fn skeleton_manager(&self) -> &Arc<SkeletonManager> {
        &self.skeleton_manager
    }

    #[must_use]
    pub fn morph_target_animations(&self) -> &Arc<MorphTargetAniManager> {
        &self.morph_target_animations
    }

    /// Names of all skeleton and morph target animations, sorted.
    #[must_use]
    pub fn animation_names(&self) -> Vec<String> {
        let mut names = self.skeleton_manager.names();
        names.extend(self.morph_target_animations.names());
        names.sort();
        names.dedup();
        names
    }

    /// Playback description of the named animation. Skeleton animations
    /// shadow morph target animations of the same name.
    #[must_use]
    pub fn animation_info(&self, name: &str) -> Option<AnimationInfo> {
        if let Some(skeleton) = self.skeleton_manager.get(name) {
            return Some(skeleton.info().clone());
        }
        self.morph_target_animations
            .get(name)
            .map(|animation| animation.info().clone())
    }
}
