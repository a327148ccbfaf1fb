//! CPU skinning.
//!
//! [`SoftwareMeshAnimationManager`] runs the shared animation pipeline and
//! then writes the skinned vertices into the mesh handler's vertex buffer:
//!
//! 1. Copy the base morph target positions into the destination
//! 2. Add the weighted deltas of every relative morph target (never target 0)
//! 3. Transform positions in place, and normals, tangents and binormals from
//!    the base, by the weighted joint transforms
//!
//! The inner loop is monomorphized for the common attribute combinations,
//! all other combinations take a runtime checked path.

use glam::{Mat3, Vec3};

use crate::errors::{MeshError, Result};
use crate::mesh::animation_manager::{
    AnimationManagerState, MeshAnimationManager, apply_animation_states,
};
use crate::mesh::handler::MeshHandler;
use crate::resources::buffer::{
    VertexReadLock, VertexSemantic, VertexWriteLock, read_vec3, write_vec3,
};
use crate::resources::{MeshMorphTarget, VertexWeights, Weight};
use crate::settings::{AnimationSettings, SkinningBackend};
use crate::skeleton::JointHandler;

/// Mesh animation manager that skins on the CPU.
#[derive(Debug, Clone, Default)]
pub struct SoftwareMeshAnimationManager {
    state: AnimationManagerState,
}

impl SoftwareMeshAnimationManager {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            state: AnimationManagerState::new(settings),
        }
    }
}

impl MeshAnimationManager for SoftwareMeshAnimationManager {
    fn key(&self) -> &'static str {
        SkinningBackend::Software.key()
    }

    fn state(&self) -> &AnimationManagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnimationManagerState {
        &mut self.state
    }

    fn apply(&self, handler: &mut MeshHandler) -> Result<()> {
        apply_animation_states(&self.state, handler)?;
        skin_mesh(handler)
    }
}

/// Writes the morphed and skinned vertices of `handler` into its vertex
/// buffer, using the joint states as they are.
///
/// Fails without touching any vertex if the destination is the base buffer
/// itself or either buffer cannot be locked. Meshes without a skeleton
/// handler only get the morph targets applied.
pub fn skin_mesh(handler: &MeshHandler) -> Result<()> {
    let mesh = handler.mesh().ok_or(MeshError::MissingMesh)?;
    let source = mesh
        .morph_target(0)
        .ok_or_else(|| MeshError::MissingMorphTarget("base".to_string()))?
        .vertex_buffer
        .as_ref()
        .ok_or(MeshError::MissingVertexBuffer("base morph target"))?;
    let target = handler
        .vertex_buffer()
        .ok_or(MeshError::MissingVertexBuffer("mesh handler"))?;

    if source == target {
        return Err(MeshError::BufferAliasing {
            label: source.label().to_string(),
        });
    }
    let skeleton_handler = handler.skeleton_handler();
    if skeleton_handler.is_some() && mesh.vertex_weights().is_empty() {
        return Err(MeshError::MissingVertexWeights(mesh.name().to_string()));
    }

    let source = source.lock_read()?;
    let mut target = target.lock_write()?;

    copy_positions(&source, &mut target)?;

    let weights = handler.morph_target_weights();
    for (index, morph_target) in mesh.morph_targets().iter().enumerate().skip(1) {
        let weight = weights.get(index).copied().unwrap_or(0.0);
        if morph_target.relative && weight != 0.0 {
            add_morph_target(morph_target, weight, &mut target);
        }
    }

    let Some(skeleton_handler) = skeleton_handler else {
        return Ok(());
    };
    skin_vertices(
        &source,
        &mut target,
        mesh.weights(),
        mesh.vertex_weights(),
        skeleton_handler.joint_handlers(),
    )
}

fn position_offset(offset: Option<usize>, label: &str) -> Result<usize> {
    offset.ok_or_else(|| MeshError::MissingAttribute {
        label: label.to_string(),
        semantic: VertexSemantic::Position,
    })
}

fn copy_positions(source: &VertexReadLock<'_>, target: &mut VertexWriteLock<'_>) -> Result<()> {
    let src_offset = position_offset(source.attribute_offset(VertexSemantic::Position), "base")?;
    let dst_offset = position_offset(target.attribute_offset(VertexSemantic::Position), "target")?;
    let (src_stride, dst_stride) = (source.vertex_size(), target.vertex_size());
    let count = source.num_vertices().min(target.num_vertices());

    let src = source.bytes();
    let dst = target.bytes_mut();
    for vertex in 0..count {
        let position = read_vec3(src, vertex * src_stride + src_offset);
        write_vec3(dst, vertex * dst_stride + dst_offset, position);
    }
    Ok(())
}

// Adds `delta * weight` per vertex. Targets whose buffer cannot be read are skipped.
fn add_morph_target(morph_target: &MeshMorphTarget, weight: f32, target: &mut VertexWriteLock<'_>) {
    let Some(buffer) = &morph_target.vertex_buffer else {
        return;
    };
    let deltas = match buffer.lock_read() {
        Ok(deltas) => deltas,
        Err(err) => {
            log::debug!("Morph target '{}' skipped: {err}", morph_target.name);
            return;
        }
    };
    let (Some(src_offset), Some(dst_offset)) = (
        deltas.attribute_offset(VertexSemantic::Position),
        target.attribute_offset(VertexSemantic::Position),
    ) else {
        return;
    };
    let (src_stride, dst_stride) = (deltas.vertex_size(), target.vertex_size());
    let num_targets = target.num_vertices();

    let src = deltas.bytes();
    let dst = target.bytes_mut();
    let mut add = |delta_index: usize, vertex: usize| {
        if vertex >= num_targets {
            return;
        }
        let delta = read_vec3(src, delta_index * src_stride + src_offset);
        let offset = vertex * dst_stride + dst_offset;
        write_vec3(dst, offset, read_vec3(dst, offset) + delta * weight);
    };

    if morph_target.vertex_ids.is_empty() {
        for vertex in 0..deltas.num_vertices() {
            add(vertex, vertex);
        }
    } else {
        let count = deltas.num_vertices().min(morph_target.vertex_ids.len());
        for (delta_index, &vertex) in morph_target.vertex_ids[..count].iter().enumerate() {
            add(delta_index, vertex as usize);
        }
    }
}

// ============================================================================
// Skinning Kernels
// ============================================================================

/// Source and destination byte offset of a directional attribute present
/// in both buffers.
#[derive(Debug, Clone, Copy, Default)]
struct AttributePair {
    src: usize,
    dst: usize,
}

struct SkinContext<'a> {
    src: &'a [u8],
    dst: &'a mut [u8],
    src_stride: usize,
    dst_stride: usize,
    position: usize,
    normal: Option<AttributePair>,
    tangent: Option<AttributePair>,
    binormal: Option<AttributePair>,
    weights: &'a [Weight],
    vertex_weights: &'a [VertexWeights],
    joints: &'a [JointHandler],
    count: usize,
}

fn skin_vertices(
    source: &VertexReadLock<'_>,
    target: &mut VertexWriteLock<'_>,
    weights: &[Weight],
    vertex_weights: &[VertexWeights],
    joints: &[JointHandler],
) -> Result<()> {
    let position = position_offset(target.attribute_offset(VertexSemantic::Position), "target")?;
    let pair = |semantic| {
        Some(AttributePair {
            src: source.attribute_offset(semantic)?,
            dst: target.attribute_offset(semantic)?,
        })
    };
    let normal = pair(VertexSemantic::Normal);
    let tangent = pair(VertexSemantic::Tangent);
    let binormal = pair(VertexSemantic::Binormal);

    let count = target
        .num_vertices()
        .min(source.num_vertices())
        .min(vertex_weights.len());
    let src_stride = source.vertex_size();
    let dst_stride = target.vertex_size();

    let mut ctx = SkinContext {
        src: source.bytes(),
        dst: target.bytes_mut(),
        src_stride,
        dst_stride,
        position,
        normal,
        tangent,
        binormal,
        weights,
        vertex_weights,
        joints,
        count,
    };

    match (normal.is_some(), tangent.is_some(), binormal.is_some()) {
        (false, false, false) => skin_pass::<false, false, false>(&mut ctx),
        (true, false, false) => skin_pass::<true, false, false>(&mut ctx),
        (true, true, true) => skin_pass::<true, true, true>(&mut ctx),
        (true, true, false) => skin_pass::<true, true, false>(&mut ctx),
        (true, false, true) => skin_pass::<true, false, true>(&mut ctx),
        (has_normal, has_tangent, has_binormal) => {
            skin_pass_dynamic(&mut ctx, has_normal, has_tangent, has_binormal);
        }
    }
    Ok(())
}

fn skin_pass<const N: bool, const T: bool, const B: bool>(ctx: &mut SkinContext<'_>) {
    for vertex in 0..ctx.count {
        skin_vertex::<N, T, B>(ctx, vertex);
    }
}

// Layouts without a specialized pass pick the kernel per vertex.
fn skin_pass_dynamic(ctx: &mut SkinContext<'_>, normal: bool, tangent: bool, binormal: bool) {
    for vertex in 0..ctx.count {
        match (normal, tangent, binormal) {
            (false, true, true) => skin_vertex::<false, true, true>(ctx, vertex),
            (false, true, false) => skin_vertex::<false, true, false>(ctx, vertex),
            (false, false, true) => skin_vertex::<false, false, true>(ctx, vertex),
            // Missing attributes are skipped, so this kernel fits any layout
            _ => skin_vertex::<true, true, true>(ctx, vertex),
        }
    }
}

#[derive(Clone, Copy)]
struct Skinned {
    position: Vec3,
    normal: Vec3,
    tangent: Vec3,
    binormal: Vec3,
}

/// Skins one vertex. `N`, `T` and `B` select which directional attributes
/// are transformed; a selected attribute missing from `ctx` is skipped.
#[inline]
fn skin_vertex<const N: bool, const T: bool, const B: bool>(ctx: &mut SkinContext<'_>, vertex: usize) {
    let src_base = vertex * ctx.src_stride;
    let dst_base = vertex * ctx.dst_stride;
    let read_src = |pair: Option<AttributePair>| {
        pair.map_or(Vec3::ZERO, |p| read_vec3(ctx.src, src_base + p.src))
    };

    let position = read_vec3(ctx.dst, dst_base + ctx.position);
    let normal = if N { read_src(ctx.normal) } else { Vec3::ZERO };
    let tangent = if T { read_src(ctx.tangent) } else { Vec3::ZERO };
    let binormal = if B { read_src(ctx.binormal) } else { Vec3::ZERO };

    let mut result: Option<Skinned> = None;
    for &index in &ctx.vertex_weights[vertex].weights {
        let Some(weight) = ctx.weights.get(index as usize) else {
            continue;
        };
        let Some(joint) = ctx.joints.get(weight.joint as usize) else {
            continue;
        };
        let transform: Mat3 = joint.transform();
        let bias = weight.bias;
        let skinned = Skinned {
            position: (transform * position + joint.translation_joint_space()) * bias,
            normal: if N { transform * normal * bias } else { Vec3::ZERO },
            tangent: if T { transform * tangent * bias } else { Vec3::ZERO },
            binormal: if B { transform * binormal * bias } else { Vec3::ZERO },
        };
        match result.as_mut() {
            None => result = Some(skinned),
            Some(acc) => {
                acc.position += skinned.position;
                acc.normal += skinned.normal;
                acc.tangent += skinned.tangent;
                acc.binormal += skinned.binormal;
            }
        }
    }

    // Vertices without a usable weight keep their morphed position
    let Some(skinned) = result else {
        return;
    };
    write_vec3(ctx.dst, dst_base + ctx.position, skinned.position);
    let mut write = |pair: Option<AttributePair>, value: Vec3| {
        if let Some(p) = pair {
            write_vec3(ctx.dst, dst_base + p.dst, value);
        }
    };
    if N {
        write(ctx.normal, skinned.normal);
    }
    if T {
        write(ctx.tangent, skinned.tangent);
    }
    if B {
        write(ctx.binormal, skinned.binormal);
    }
}
