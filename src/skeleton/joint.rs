use bitflags::bitflags;
use glam::{Quat, Vec3};

bitflags! {
    /// Components of a joint that carry a key per animation frame.
    ///
    /// Keys are stored per frame in joint order, and per joint in the order
    /// of the flag bits. Components without keys take the bind pose value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnimatedComponents: u8 {
        const TRANSLATION_X = 1 << 0;
        const TRANSLATION_Y = 1 << 1;
        const TRANSLATION_Z = 1 << 2;
        const ROTATION_X = 1 << 3;
        const ROTATION_Y = 1 << 4;
        const ROTATION_Z = 1 << 5;
        const ROTATION_W = 1 << 6;

        const TRANSLATION = Self::TRANSLATION_X.bits() | Self::TRANSLATION_Y.bits() | Self::TRANSLATION_Z.bits();
        const ROTATION_XYZ = Self::ROTATION_X.bits() | Self::ROTATION_Y.bits() | Self::ROTATION_Z.bits();
        const ROTATION = Self::ROTATION_XYZ.bits() | Self::ROTATION_W.bits();
    }
}

impl AnimatedComponents {
    /// Number of floats one frame stores for a joint with this mask.
    #[inline]
    #[must_use]
    pub fn key_count(self) -> usize {
        self.bits().count_ones() as usize
    }
}

/// One node of a skeleton template.
///
/// `translation` and `rotation` are the bind pose relative to the parent.
/// The absolute and joint space transforms are derived by
/// `Skeleton::update_joint_information`.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    name: String,
    parent: Option<u32>,
    pub(crate) children: Vec<u32>,

    pub translation: Vec3,
    pub rotation: Quat,
    pub animated: AnimatedComponents,

    pub(crate) translation_absolute: Vec3,
    pub(crate) rotation_absolute: Quat,
    pub(crate) translation_joint_space: Vec3,
    pub(crate) rotation_joint_space: Quat,
}

impl Joint {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            animated: AnimatedComponents::empty(),
            translation_absolute: Vec3::ZERO,
            rotation_absolute: Quat::IDENTITY,
            translation_joint_space: Vec3::ZERO,
            rotation_joint_space: Quat::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_animated(mut self, animated: AnimatedComponents) -> Self {
        self.animated = animated;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent joint index as configured. An index that does not resolve to
    /// another joint of the skeleton makes this a root joint.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<u32>) {
        self.parent = parent;
    }

    /// Child joint indices, valid after the skeleton was updated.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[u32] {
        &self.children
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

    /// Translation of the inverse absolute bind pose.
    #[inline]
    #[must_use]
    pub fn translation_joint_space(&self) -> Vec3 {
        self.translation_joint_space
    }

    /// Rotation of the inverse absolute bind pose.
    #[inline]
    #[must_use]
    pub fn rotation_joint_space(&self) -> Quat {
        self.rotation_joint_space
    }

    // Composes the absolute bind pose from the parent's and derives its inverse.
    pub(crate) fn calculate_initial_states(&mut self, parent: Option<(Vec3, Quat)>) {
        match parent {
            Some((translation, rotation)) => {
                self.translation_absolute = rotation * self.translation + translation;
                self.rotation_absolute = rotation * self.rotation;
            }
            None => {
                self.translation_absolute = self.translation;
                self.rotation_absolute = self.rotation;
            }
        }
        self.rotation_joint_space = self.rotation_absolute.inverse();
        self.translation_joint_space = self.rotation_joint_space * -self.translation_absolute;
    }
}
