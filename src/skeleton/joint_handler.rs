use glam::{Mat3, Quat, Vec3};

use crate::skeleton::joint::Joint;

/// Runtime pose of one joint.
///
/// `translation` and `rotation` are the pose relative to the parent joint
/// for the current frame. The absolute pose and the skinning transform are
/// derived by [`calculate_states`](Self::calculate_states) and are only valid
/// after the parent handler was calculated in the same pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointHandler {
    joint: Option<u32>,
    /// Excludes the joint from resets and animation blending
    pub user_controlled: bool,

    pub translation: Vec3,
    pub rotation: Quat,

    translation_absolute: Vec3,
    rotation_absolute: Quat,
    transform: Mat3,
    translation_joint_space: Vec3,
}

impl Default for JointHandler {
    fn default() -> Self {
        Self::unbound()
    }
}

impl JointHandler {
    /// A handler slot without a joint. Traversals skip such slots.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            joint: None,
            user_controlled: false,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            translation_absolute: Vec3::ZERO,
            rotation_absolute: Quat::IDENTITY,
            transform: Mat3::IDENTITY,
            translation_joint_space: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn bound(joint: u32) -> Self {
        Self {
            joint: Some(joint),
            ..Self::unbound()
        }
    }

    /// Index of the skeleton joint this handler drives.
    #[inline]
    #[must_use]
    pub fn joint(&self) -> Option<u32> {
        self.joint
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.joint.is_some()
    }

    #[inline]
    #[must_use]
    pub fn translation_absolute(&self) -> Vec3 {
        self.translation_absolute
    }

    #[inline]
    #[must_use]
    pub fn rotation_absolute(&self) -> Quat {
        self.rotation_absolute
    }

    /// Skinning rotation: the absolute pose composed with the inverse bind pose.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Mat3 {
        self.transform
    }

    /// Skinning translation, applied after [`transform`](Self::transform).
    #[inline]
    #[must_use]
    pub fn translation_joint_space(&self) -> Vec3 {
        self.translation_joint_space
    }

    /// Zero relative and absolute pose with identity skinning.
    pub(crate) fn reset_to_identity(&mut self) {
        *self = Self {
            joint: self.joint,
            user_controlled: self.user_controlled,
            ..Self::unbound()
        };
    }

    /// Copies the bind pose of `joint`. The skinning transform becomes the
    /// identity.
    pub(crate) fn reset_to_bind(&mut self, joint: &Joint) {
        self.translation = joint.translation;
        self.rotation = joint.rotation;
        self.translation_absolute = joint.translation_absolute();
        self.rotation_absolute = joint.rotation_absolute();
        self.update_skinning(joint);
    }

    /// Composes the absolute pose from `parent` (root joints pass `None`)
    /// and derives the skinning transform against the bind pose of `joint`.
    pub fn calculate_states(&mut self, joint: &Joint, parent: Option<&JointHandler>) {
        match parent {
            Some(parent) => {
                self.translation_absolute =
                    parent.rotation_absolute * self.translation + parent.translation_absolute;
                self.rotation_absolute = parent.rotation_absolute * self.rotation;
            }
            None => {
                self.translation_absolute = self.translation;
                self.rotation_absolute = self.rotation;
            }
        }
        self.update_skinning(joint);
    }

    fn update_skinning(&mut self, joint: &Joint) {
        self.transform = Mat3::from_quat(self.rotation_absolute * joint.rotation_joint_space());
        self.translation_joint_space =
            self.rotation_absolute * joint.translation_joint_space() + self.translation_absolute;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_pose_skins_to_identity() {
        let mut joint = Joint::new("hip")
            .with_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(0.7));
        joint.calculate_initial_states(None);

        let mut handler = JointHandler::bound(0);
        handler.reset_to_bind(&joint);

        let p = Vec3::new(-4.0, 0.5, 2.0);
        let skinned = handler.transform() * p + handler.translation_joint_space();
        assert!((skinned - p).length() < 1e-5);
    }

    #[test]
    fn identity_reset_keeps_binding_and_flag() {
        let mut handler = JointHandler::bound(3);
        handler.user_controlled = true;
        handler.translation = Vec3::ONE;
        handler.reset_to_identity();
        assert_eq!(handler.joint(), Some(3));
        assert!(handler.user_controlled);
        assert_eq!(handler.translation, Vec3::ZERO);
    }
}
