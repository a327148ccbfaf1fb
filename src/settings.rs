//! Animation Settings & Skinning Backend Configuration
//!
//! This module defines the knobs that control a mesh animation manager's
//! per-frame pipeline and how vertex weight data is validated.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pl_mesh::settings::{AnimationSettings, SkinningBackend};
//!
//! // Default: reset joints and morph weights every frame, then apply the base pose
//! let settings = AnimationSettings::default();
//!
//! // Ragdoll / IK driven meshes reset joint states themselves
//! let settings = AnimationSettings::default().with_reset_joint_states(false);
//!
//! let manager = registry.create(SkinningBackend::Software.key(), settings)?;
//! ```

// ---------------------------------------------------------------------------
// AnimationSettings
// ---------------------------------------------------------------------------

/// Per-manager switches for the stages of `MeshAnimationManager::apply`.
///
/// | Stage                     | Switch                    | Default |
/// |---------------------------|---------------------------|---------|
/// | Reset current joint pose  | `reset_joint_states`      | ✅      |
/// | Reset morph weights       | `reset_morph_weights`     | ✅      |
/// | Add base joint deltas     | `apply_base_joint_states` | ✅      |
///
/// Hierarchy composition and (for the software backend) skinning always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSettings {
    /// Reset the current joint handlers to the bind pose before sampling.
    pub reset_joint_states: bool,
    /// Copy the base morph target weights over the current weights before sampling.
    pub reset_morph_weights: bool,
    /// Add the base joint handler deltas after all animations were sampled.
    pub apply_base_joint_states: bool,
}

impl Default for AnimationSettings {
    #[inline]
    fn default() -> Self {
        Self {
            reset_joint_states: true,
            reset_morph_weights: true,
            apply_base_joint_states: true,
        }
    }
}

impl AnimationSettings {
    #[must_use]
    pub fn with_reset_joint_states(mut self, enabled: bool) -> Self {
        self.reset_joint_states = enabled;
        self
    }

    #[must_use]
    pub fn with_reset_morph_weights(mut self, enabled: bool) -> Self {
        self.reset_morph_weights = enabled;
        self
    }

    #[must_use]
    pub fn with_apply_base_joint_states(mut self, enabled: bool) -> Self {
        self.apply_base_joint_states = enabled;
        self
    }
}

// ---------------------------------------------------------------------------
// SkinningBackend
// ---------------------------------------------------------------------------

/// Selects which mesh animation manager strategy is created for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkinningBackend {
    /// Computes joint states only. The vertex buffer is left untouched so
    /// that a consumer can skin with the joint matrices itself.
    JointStatesOnly,
    /// Computes joint states and skins the vertices on the CPU.
    #[default]
    Software,
}

impl SkinningBackend {
    /// Registry key of the manager implementing this backend.
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::JointStatesOnly => "joint_states",
            Self::Software => "software",
        }
    }

    /// Resolves a registry key back to a backend.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "joint_states" => Some(Self::JointStatesOnly),
            "software" => Some(Self::Software),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WeightValidation
// ---------------------------------------------------------------------------

/// Policy applied to per-vertex bias sums when vertex weights are validated.
///
/// Skinning itself never normalizes: it trusts that the biases of a vertex
/// add up to one. Validation is a content-load step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightValidation {
    /// Accept the data as is.
    Trust,
    /// Log every vertex whose biases do not sum to one.
    #[default]
    Warn,
    /// Rescale the biases of offending vertices so they sum to one.
    Normalize,
    /// Fail on the first offending vertex.
    Reject,
}

/// Allowed deviation of a vertex bias sum from one.
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;
