use std::sync::Arc;

use crate::animation::{Animation, AnimationInfo, AnimationKind};
use crate::errors::{MeshError, Result};
use crate::mesh::handler::MeshHandler;
use crate::resources::Mesh;
use crate::settings::{AnimationSettings, SkinningBackend};

// ============================================================================
// Shared State
// ============================================================================

/// Settings and animation playback list shared by all manager strategies.
#[derive(Debug, Clone, Default)]
pub struct AnimationManagerState {
    pub settings: AnimationSettings,
    animations: Vec<Animation>,
}

impl AnimationManagerState {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            animations: Vec::new(),
        }
    }

    #[must_use]
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name() == name)
    }

    pub fn animation_mut(&mut self, name: &str) -> Option<&mut Animation> {
        self.animations.iter_mut().find(|a| a.name() == name)
    }

    /// Returns the playback state of `name`, creating an inactive one if
    /// none exists.
    pub fn add_animation(&mut self, name: &str) -> &mut Animation {
        let index = match self.animations.iter().position(|a| a.name() == name) {
            Some(index) => index,
            None => {
                self.animations.push(Animation::new(name));
                self.animations.len() - 1
            }
        };
        &mut self.animations[index]
    }

    /// Starts playing `info` under its own name.
    pub fn start(&mut self, info: &AnimationInfo, restart: bool) -> &mut Animation {
        let animation = self.add_animation(&info.name);
        animation.start_with_info(info, restart);
        animation
    }

    pub fn remove_animation(&mut self, name: &str) -> Option<Animation> {
        let index = self.animations.iter().position(|a| a.name() == name)?;
        Some(self.animations.remove(index))
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Per-frame animation strategy of a [`MeshHandler`].
///
/// `update` advances playback, `apply` turns the playback state into joint
/// states, morph target weights and (depending on the strategy) vertex data.
pub trait MeshAnimationManager: Send + Sync + std::fmt::Debug {
    /// Registry key of this strategy.
    fn key(&self) -> &'static str;

    fn state(&self) -> &AnimationManagerState;

    fn state_mut(&mut self) -> &mut AnimationManagerState;

    /// Advances all animations by `dt` seconds. Returns `true` if any frame
    /// position changed, which makes the mesh handler re-apply.
    fn update(&mut self, dt: f32) -> bool {
        self.state_mut()
            .animations
            .iter_mut()
            .fold(false, |changed, animation| animation.update(dt) || changed)
    }

    /// Applies the current playback state to `handler`.
    fn apply(&self, handler: &mut MeshHandler) -> Result<()>;
}

/// Computes joint states and morph target weights only. Consumers skin
/// with the joint handler transforms themselves.
#[derive(Debug, Clone, Default)]
pub struct BasicMeshAnimationManager {
    state: AnimationManagerState,
}

impl BasicMeshAnimationManager {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            state: AnimationManagerState::new(settings),
        }
    }
}

impl MeshAnimationManager for BasicMeshAnimationManager {
    fn key(&self) -> &'static str {
        SkinningBackend::JointStatesOnly.key()
    }

    fn state(&self) -> &AnimationManagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnimationManagerState {
        &mut self.state
    }

    fn apply(&self, handler: &mut MeshHandler) -> Result<()> {
        apply_animation_states(&self.state, handler)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Resets the pose, samples every active animation into it and composes
/// the joint hierarchy.
///
/// Pipeline:
/// 1. Reset the current joint states (user controlled joints are kept)
/// 2. Copy the base morph target weights over the current ones
/// 3. Accumulate every active animation at its current frame
/// 4. Add the base joint states
/// 5. Compose the absolute joint states
///
/// Steps 1, 2 and 4 follow [`AnimationSettings`]. Animations that cannot be
/// resolved or sampled are logged and skipped.
pub fn apply_animation_states(state: &AnimationManagerState, handler: &mut MeshHandler) -> Result<()> {
    let mesh = Arc::clone(handler.mesh().ok_or(MeshError::MissingMesh)?);
    let settings = state.settings;

    if settings.reset_joint_states
        && let Some(skeleton_handler) = handler.skeleton_handler_mut()
    {
        skeleton_handler.reset_joint_states(false)?;
    }
    if settings.reset_morph_weights {
        handler.reset_morph_target_weights();
    }

    for animation in state.animations().iter().filter(|a| a.is_active()) {
        if let Err(err) = apply_animation(&mesh, animation, handler) {
            log::warn!("Skipping animation '{}': {err}", animation.name());
        }
    }

    if let Some(skeleton_handler) = handler.skeleton_handler_mut() {
        if settings.apply_base_joint_states {
            skeleton_handler.apply_base_joint_states()?;
        }
        skeleton_handler.calculate_states()?;
    }
    Ok(())
}

fn apply_animation(mesh: &Mesh, animation: &Animation, handler: &mut MeshHandler) -> Result<()> {
    let frame1 = animation.current_frame();
    let frame2 = animation.next_frame();
    let t = animation.progress();
    let weight = animation.weight();
    let name = animation.name();

    match animation.kind() {
        AnimationKind::Skeleton => {
            let skeleton = mesh
                .skeleton_manager()
                .get(name)
                .or_else(|| mesh.skeleton().filter(|s| s.name() == name).cloned())
                .ok_or_else(|| MeshError::MissingAnimation(name.to_string()))?;
            let Some(skeleton_handler) = handler.skeleton_handler_mut() else {
                return Err(MeshError::MissingSkeleton);
            };
            skeleton.apply_joint_states_blended(
                skeleton_handler.joint_handlers_mut(),
                frame1,
                frame2,
                t,
                weight,
            )
        }
        AnimationKind::Vertex => {
            let morph_ani = mesh
                .morph_target_animations()
                .get(name)
                .ok_or_else(|| MeshError::MissingAnimation(name.to_string()))?;
            morph_ani.apply_morph_target_weights(
                mesh,
                handler.morph_target_weights_mut(),
                frame1,
                frame2,
                t,
                weight,
            )
        }
    }
}
