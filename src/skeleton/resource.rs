use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::animation::info::{AnimationInfo, AnimationKind};
use crate::animation::values::Interpolatable;
use crate::errors::{MeshError, Result};
use crate::resources::manager::{Resource, ResourceManager};
use crate::skeleton::joint::{AnimatedComponents, Joint};
use crate::skeleton::joint_handler::JointHandler;

/// Shared skeleton storage with name lookup.
pub type SkeletonManager = ResourceManager<Skeleton>;

/// Hierarchical joint template with its bind pose.
///
/// A skeleton doubles as a skeleton animation: it may carry one list of
/// frame keys per frame, sampled through [`Skeleton::apply_joint_states`].
///
/// Call [`Skeleton::update_joint_information`] after the joints were added
/// or their parents changed. Until then child lists, root joints and
/// absolute bind poses are stale.
#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    root_joints: Vec<u32>,
    lookup: FxHashMap<String, u32>,
    frame_keys: Vec<Vec<f32>>,
    info: AnimationInfo,
}

impl Resource for Skeleton {
    fn name(&self) -> &str {
        &self.info.name
    }
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            joints: Vec::new(),
            root_joints: Vec::new(),
            lookup: FxHashMap::default(),
            frame_keys: Vec::new(),
            info: AnimationInfo::new(name, AnimationKind::Skeleton),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    // ========================================================================
    // Joints
    // ========================================================================

    /// Appends a joint and returns its index. If the name is already taken,
    /// lookups by name keep resolving to the first joint.
    pub fn add_joint(&mut self, joint: Joint) -> u32 {
        let index = self.joints.len() as u32;
        self.lookup.entry(joint.name().to_string()).or_insert(index);
        self.joints.push(joint);
        index
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn joint(&self, index: u32) -> Option<&Joint> {
        self.joints.get(index as usize)
    }

    /// Mutable joint access. Renaming is not possible; topology or bind pose
    /// edits require [`Skeleton::update_joint_information`].
    pub fn joint_mut(&mut self, index: u32) -> Option<&mut Joint> {
        self.joints.get_mut(index as usize)
    }

    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joint(self.joint_index(name)?)
    }

    /// Indices of the joints without a valid parent.
    #[inline]
    #[must_use]
    pub fn root_joints(&self) -> &[u32] {
        &self.root_joints
    }

    /// Rebuilds child lists and root joints, then computes the absolute and
    /// joint space bind pose of every joint top-down.
    ///
    /// A parent index that is out of range or points at the joint itself
    /// makes the joint a root. Joints on a parent cycle are not reachable
    /// from any root and keep their relative pose as absolute pose.
    pub fn update_joint_information(&mut self) {
        let count = self.joints.len();
        self.root_joints.clear();
        for joint in &mut self.joints {
            joint.children.clear();
        }

        for index in 0..count {
            match self.resolved_parent(index) {
                Some(parent) => self.joints[parent].children.push(index as u32),
                None => self.root_joints.push(index as u32),
            }
        }

        for joint in &mut self.joints {
            joint.calculate_initial_states(None);
        }

        let mut stack: Vec<(usize, Option<(Vec3, Quat)>)> =
            self.root_joints.iter().rev().map(|&root| (root as usize, None)).collect();
        while let Some((index, parent)) = stack.pop() {
            let joint = &mut self.joints[index];
            joint.calculate_initial_states(parent);
            let pose = Some((joint.translation_absolute(), joint.rotation_absolute()));
            stack.extend(joint.children.iter().rev().map(|&child| (child as usize, pose)));
        }
    }

    pub(crate) fn resolved_parent(&self, index: usize) -> Option<usize> {
        let parent = self.joints.get(index)?.parent()? as usize;
        (parent != index && parent < self.joints.len()).then_some(parent)
    }

    // ========================================================================
    // Animation
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn info(&self) -> &AnimationInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut AnimationInfo {
        &mut self.info
    }

    #[inline]
    #[must_use]
    pub fn num_frames(&self) -> u32 {
        self.frame_keys.len() as u32
    }

    /// Appends one frame of keys: for every joint in order, one float per
    /// animated component. The end frame of the info follows the key count.
    pub fn push_frame_keys(&mut self, keys: Vec<f32>) {
        self.frame_keys.push(keys);
        self.info.end_frame = self.num_frames() - 1;
    }

    #[must_use]
    pub fn frame_keys(&self, frame: u32) -> Option<&[f32]> {
        self.frame_keys.get(frame as usize).map(Vec::as_slice)
    }

    /// Relative pose of every joint at `frame`. Components without keys
    /// take the bind pose value.
    pub fn sample_frame(&self, frame: u32) -> Result<Vec<(Vec3, Quat)>> {
        let keys = self.frame_keys(frame).ok_or(MeshError::FrameOutOfRange {
            frame,
            frames: self.num_frames(),
        })?;

        let mut offset = 0;
        Ok(self
            .joints
            .iter()
            .map(|joint| sample_joint(joint, keys, &mut offset))
            .collect())
    }

    /// Adds the pose at `frame`, scaled by `weight`, onto `handlers`.
    /// Same as the blended variant with both frames equal.
    pub fn apply_joint_states(&self, handlers: &mut [JointHandler], frame: u32, weight: f32) -> Result<()> {
        self.apply_joint_states_blended(handlers, frame, frame, 0.0, weight)
    }

    /// Adds the pose between `frame1` and `frame2` at `t` onto `handlers`.
    ///
    /// The sampled pose is applied as a delta from the bind pose, scaled by
    /// `weight`: the translation delta is added, the rotation delta is
    /// slerped from identity and multiplied on. Handlers are matched to
    /// joints by index. User controlled and unbound handlers are skipped.
    pub fn apply_joint_states_blended(
        &self,
        handlers: &mut [JointHandler],
        frame1: u32,
        frame2: u32,
        t: f32,
        weight: f32,
    ) -> Result<()> {
        let pose1 = self.sample_frame(frame1)?;
        let pose2 = if frame2 == frame1 {
            None
        } else {
            Some(self.sample_frame(frame2)?)
        };

        for (index, (joint, handler)) in self.joints.iter().zip(handlers.iter_mut()).enumerate() {
            if handler.user_controlled || !handler.is_bound() {
                continue;
            }

            let (mut translation, mut rotation) = pose1[index];
            if let Some(pose2) = &pose2 {
                let (translation2, rotation2) = pose2[index];
                translation = Vec3::interpolate_linear(translation, translation2, t);
                rotation = Quat::interpolate_linear(rotation, rotation2, t);
            }

            let translation_delta = translation - joint.translation;
            let rotation_delta = joint.rotation.inverse() * rotation;

            handler.translation += translation_delta * weight;
            handler.rotation =
                (handler.rotation * Quat::IDENTITY.slerp(rotation_delta, weight)).normalize();
        }
        Ok(())
    }
}

// Reads the keys of one joint, advancing `offset` past them.
fn sample_joint(joint: &Joint, keys: &[f32], offset: &mut usize) -> (Vec3, Quat) {
    let animated = joint.animated;
    let mut next = |flag: AnimatedComponents, bind: f32| {
        if !animated.contains(flag) {
            return bind;
        }
        let value = keys.get(*offset).copied().unwrap_or(bind);
        *offset += 1;
        value
    };

    let translation = Vec3::new(
        next(AnimatedComponents::TRANSLATION_X, joint.translation.x),
        next(AnimatedComponents::TRANSLATION_Y, joint.translation.y),
        next(AnimatedComponents::TRANSLATION_Z, joint.translation.z),
    );
    let x = next(AnimatedComponents::ROTATION_X, joint.rotation.x);
    let y = next(AnimatedComponents::ROTATION_Y, joint.rotation.y);
    let z = next(AnimatedComponents::ROTATION_Z, joint.rotation.z);
    let w = if animated.intersects(AnimatedComponents::ROTATION_XYZ)
        && !animated.contains(AnimatedComponents::ROTATION_W)
    {
        // Unit quaternion with negative real part
        let term = 1.0 - x * x - y * y - z * z;
        if term < 0.0 { 0.0 } else { -term.sqrt() }
    } else {
        next(AnimatedComponents::ROTATION_W, joint.rotation.w)
    };

    (translation, Quat::from_xyzw(x, y, z, w).normalize())
}
