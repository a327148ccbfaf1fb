use std::sync::Arc;

use glam::Quat;

use crate::errors::{MeshError, Result};
use crate::skeleton::joint_handler::JointHandler;
use crate::skeleton::resource::Skeleton;

/// Runtime pose of a skeleton instance.
///
/// Holds two joint handler arrays, indexed like the joints of the bound
/// skeleton:
/// - **current**: the pose animations accumulate into each frame
/// - **base**: a constant per-instance offset added on top
///   ([`apply_base_joint_states`](Self::apply_base_joint_states))
///
/// Every method that needs the skeleton returns
/// [`MeshError::MissingSkeleton`] while none is bound and leaves the
/// handlers untouched.
#[derive(Debug, Clone, Default)]
pub struct SkeletonHandler {
    skeleton: Option<Arc<Skeleton>>,
    joint_handlers: Vec<JointHandler>,
    base_joint_handlers: Vec<JointHandler>,
}

impl SkeletonHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_skeleton(skeleton: Arc<Skeleton>) -> Self {
        let mut handler = Self::new();
        handler.set_resource(Some(skeleton));
        handler
    }

    /// Binds a skeleton (or unbinds with `None`). Both handler arrays are
    /// rebuilt and reset; user controlled flags are cleared.
    pub fn set_resource(&mut self, skeleton: Option<Arc<Skeleton>>) {
        self.joint_handlers.clear();
        self.base_joint_handlers.clear();
        self.skeleton = skeleton;

        if let Some(skeleton) = &self.skeleton {
            let count = skeleton.num_joints() as u32;
            self.base_joint_handlers = (0..count).map(JointHandler::bound).collect();
            self.joint_handlers = self.base_joint_handlers.clone();
            for (handler, joint) in self.joint_handlers.iter_mut().zip(skeleton.joints()) {
                handler.reset_to_bind(joint);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn resource(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    fn skeleton(&self) -> Result<&Skeleton> {
        self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)
    }

    // ========================================================================
    // Handler Access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn joint_handlers(&self) -> &[JointHandler] {
        &self.joint_handlers
    }

    #[inline]
    pub fn joint_handlers_mut(&mut self) -> &mut [JointHandler] {
        &mut self.joint_handlers
    }

    #[inline]
    #[must_use]
    pub fn base_joint_handlers(&self) -> &[JointHandler] {
        &self.base_joint_handlers
    }

    #[inline]
    pub fn base_joint_handlers_mut(&mut self) -> &mut [JointHandler] {
        &mut self.base_joint_handlers
    }

    #[must_use]
    pub fn joint_handler(&self, name: &str) -> Option<&JointHandler> {
        let index = self.skeleton.as_deref()?.joint_index(name)?;
        self.joint_handlers.get(index as usize)
    }

    pub fn joint_handler_mut(&mut self, name: &str) -> Option<&mut JointHandler> {
        let index = self.skeleton.as_deref()?.joint_index(name)?;
        self.joint_handlers.get_mut(index as usize)
    }

    #[must_use]
    pub fn base_joint_handler(&self, name: &str) -> Option<&JointHandler> {
        let index = self.skeleton.as_deref()?.joint_index(name)?;
        self.base_joint_handlers.get(index as usize)
    }

    pub fn base_joint_handler_mut(&mut self, name: &str) -> Option<&mut JointHandler> {
        let index = self.skeleton.as_deref()?.joint_index(name)?;
        self.base_joint_handlers.get_mut(index as usize)
    }

    // ========================================================================
    // Per-Frame Pipeline
    // ========================================================================

    /// Copies the bind pose into the current handlers. User controlled
    /// handlers are kept unless `force_all` is set.
    pub fn reset_joint_states(&mut self, force_all: bool) -> Result<()> {
        let skeleton = self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)?;
        for handler in &mut self.joint_handlers {
            if handler.user_controlled && !force_all {
                continue;
            }
            if let Some(joint) = handler.joint().and_then(|index| skeleton.joint(index)) {
                handler.reset_to_bind(joint);
            }
        }
        Ok(())
    }

    /// Resets every base handler to a zero offset.
    pub fn reset_base_joint_states(&mut self) -> Result<()> {
        self.skeleton()?;
        for handler in &mut self.base_joint_handlers {
            handler.reset_to_identity();
        }
        Ok(())
    }

    /// Adds the bound skeleton's own animation pose at `frame`.
    pub fn apply_joint_states(&mut self, frame: u32, weight: f32) -> Result<()> {
        let skeleton = self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)?;
        skeleton.apply_joint_states(&mut self.joint_handlers, frame, weight)
    }

    /// Adds the bound skeleton's own animation pose between two frames.
    pub fn apply_joint_states_blended(
        &mut self,
        frame1: u32,
        frame2: u32,
        t: f32,
        weight: f32,
    ) -> Result<()> {
        let skeleton = self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)?;
        skeleton.apply_joint_states_blended(&mut self.joint_handlers, frame1, frame2, t, weight)
    }

    /// Adds the relative pose of another handler, matching joints by name.
    ///
    /// The source pose is taken as a delta from its own skeleton's bind
    /// pose, so blending a reset source changes nothing. The translation
    /// delta is added scaled by `weight`, the rotation delta is slerped from
    /// identity by `weight` and multiplied on. Joints missing in this
    /// skeleton and user controlled handlers are skipped.
    pub fn apply_joint_states_from(&mut self, other: &SkeletonHandler, weight: f32) -> Result<()> {
        let skeleton = self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)?;
        let source = other.skeleton()?;

        for (source_joint, source_handler) in source.joints().iter().zip(&other.joint_handlers) {
            if !source_handler.is_bound() {
                continue;
            }
            let Some(handler) = skeleton
                .joint_index(source_joint.name())
                .and_then(|index| self.joint_handlers.get_mut(index as usize))
            else {
                continue;
            };
            if handler.user_controlled || !handler.is_bound() {
                continue;
            }
            let translation_delta = source_handler.translation - source_joint.translation;
            let rotation_delta = source_joint.rotation.inverse() * source_handler.rotation;

            handler.translation += translation_delta * weight;
            handler.rotation =
                (handler.rotation * Quat::IDENTITY.slerp(rotation_delta, weight)).normalize();
        }
        Ok(())
    }

    /// Adds the base handler offsets onto the current handlers, skipping
    /// user controlled ones.
    pub fn apply_base_joint_states(&mut self) -> Result<()> {
        self.skeleton()?;
        for (handler, base) in self.joint_handlers.iter_mut().zip(&self.base_joint_handlers) {
            if handler.user_controlled || !handler.is_bound() || !base.is_bound() {
                continue;
            }
            handler.translation += base.translation;
            handler.rotation = handler.rotation * base.rotation;
        }
        Ok(())
    }

    /// Composes the absolute pose of every joint reachable from a root,
    /// parents before children. Unbound handlers are skipped together with
    /// their subtree.
    pub fn calculate_states(&mut self) -> Result<()> {
        let skeleton = self.skeleton.as_deref().ok_or(MeshError::MissingSkeleton)?;

        let mut stack: Vec<(usize, Option<usize>)> =
            skeleton.root_joints().iter().rev().map(|&root| (root as usize, None)).collect();
        while let Some((index, parent)) = stack.pop() {
            let (Some(joint), Some(handler)) = (skeleton.joints().get(index), self.joint_handlers.get(index))
            else {
                continue;
            };
            if !handler.is_bound() {
                continue;
            }
            let parent = parent.and_then(|p| self.joint_handlers.get(p).copied());
            self.joint_handlers[index].calculate_states(joint, parent.as_ref());
            stack.extend(joint.children().iter().rev().map(|&child| (child as usize, Some(index))));
        }
        Ok(())
    }
}
