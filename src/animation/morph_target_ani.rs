use crate::animation::info::{AnimationInfo, AnimationKind};
use crate::animation::values::Interpolatable;
use crate::errors::{MeshError, Result};
use crate::resources::manager::{Resource, ResourceManager};
use crate::resources::mesh::Mesh;

/// Keyframed morph target weights.
///
/// Every frame stores one weight per animated morph target, in the order of
/// [`targets`](Self::targets). Targets are matched to the mesh by name when
/// applied, so one animation can drive several meshes.
#[derive(Debug, Clone)]
pub struct MorphTargetAni {
    targets: Vec<String>,
    frame_keys: Vec<Vec<f32>>,
    info: AnimationInfo,
}

pub type MorphTargetAniManager = ResourceManager<MorphTargetAni>;

impl Resource for MorphTargetAni {
    fn name(&self) -> &str {
        &self.info.name
    }
}

impl MorphTargetAni {
    #[must_use]
    pub fn new(name: &str, targets: Vec<String>) -> Self {
        Self {
            targets,
            frame_keys: Vec::new(),
            info: AnimationInfo::new(name, AnimationKind::Vertex),
        }
    }

    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    #[must_use]
    pub fn num_frames(&self) -> u32 {
        self.frame_keys.len() as u32
    }

    #[must_use]
    pub fn info(&self) -> &AnimationInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut AnimationInfo {
        &mut self.info
    }

    /// Appends one frame of weights. Missing weights are zero, extra
    /// weights are dropped. The end frame of the info follows the key count.
    pub fn push_frame(&mut self, mut weights: Vec<f32>) {
        weights.resize(self.targets.len(), 0.0);
        self.frame_keys.push(weights);
        self.info.end_frame = self.num_frames() - 1;
    }

    /// Adds the weights interpolated between `frame1` and `frame2` at `t`,
    /// scaled by `weight`, onto the matching slots of `weights` (one slot per
    /// morph target of `mesh`). Targets unknown to the mesh are skipped.
    pub fn apply_morph_target_weights(
        &self,
        mesh: &Mesh,
        weights: &mut [f32],
        frame1: u32,
        frame2: u32,
        t: f32,
        weight: f32,
    ) -> Result<()> {
        let keys1 = self.frame(frame1)?;
        let keys2 = self.frame(frame2)?;

        for (i, name) in self.targets.iter().enumerate() {
            let Some(slot) = mesh
                .morph_target_index(name)
                .and_then(|index| weights.get_mut(index))
            else {
                continue;
            };
            *slot += f32::interpolate_linear(keys1[i], keys2[i], t) * weight;
        }
        Ok(())
    }

    fn frame(&self, frame: u32) -> Result<&[f32]> {
        self.frame_keys
            .get(frame as usize)
            .map(Vec::as_slice)
            .ok_or(MeshError::FrameOutOfRange {
                frame,
                frames: self.num_frames(),
            })
    }
}
