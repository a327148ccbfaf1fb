//! Software Skinning Tests
//!
//! Tests for:
//! - Single and multi weight vertex skinning (position, normal, tangent, binormal)
//! - Specialized and generic attribute combinations
//! - Dense and sparse morph targets, base target exclusion
//! - Buffer aliasing guard and lock failures

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Quat, Vec3};

use pl_mesh::errors::MeshError;
use pl_mesh::mesh::{MeshHandler, skin_mesh};
use pl_mesh::resources::{
    Mesh, MeshMorphTarget, VertexBufferRef, VertexLayout, VertexSemantic, VertexWeights, Weight,
};
use pl_mesh::skeleton::{Joint, Skeleton};

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn position(buffer: &VertexBufferRef, vertex: usize) -> Vec3 {
    buffer
        .lock_read()
        .unwrap()
        .vec3(VertexSemantic::Position, vertex)
        .unwrap()
}

fn attribute(buffer: &VertexBufferRef, semantic: VertexSemantic, vertex: usize) -> Vec3 {
    buffer.lock_read().unwrap().vec3(semantic, vertex).unwrap()
}

/// Two joints at the origin, both roots.
fn skeleton() -> Arc<Skeleton> {
    let mut skeleton = Skeleton::new("rig");
    skeleton.add_joint(Joint::new("a"));
    skeleton.add_joint(Joint::new("b"));
    skeleton.update_joint_information();
    Arc::new(skeleton)
}

/// Vertices with position, normal, tangent and binormal; one float3 each.
fn tangent_space_buffer(positions: &[Vec3]) -> VertexBufferRef {
    let floats: Vec<f32> = positions
        .iter()
        .flat_map(|p| [p.to_array(), Vec3::Z.to_array(), Vec3::X.to_array(), Vec3::Y.to_array()])
        .flatten()
        .collect();
    VertexBufferRef::from_floats("base", VertexLayout::tangent_space(), &floats)
}

fn position_buffer(label: &str, positions: &[Vec3]) -> VertexBufferRef {
    let floats: Vec<f32> = positions.iter().flat_map(|p| p.to_array()).collect();
    VertexBufferRef::from_floats(label, VertexLayout::position(), &floats)
}

/// Builds a handler whose destination buffer is a private copy of `base`.
fn handler_for(mesh: Mesh) -> MeshHandler {
    let base = mesh.base_vertex_buffer().unwrap().clone();
    let mut handler = MeshHandler::with_mesh(Arc::new(mesh)).unwrap();
    handler.set_vertex_buffer(Some(base.duplicate("skinned").unwrap()));
    handler
}

fn skinned_mesh(base: VertexBufferRef, weights: Vec<Weight>, vertex_weights: Vec<VertexWeights>) -> Mesh {
    let mut mesh = Mesh::new("character");
    mesh.add_morph_target(MeshMorphTarget::new("base", base));
    mesh.set_skeleton(Some(skeleton()));
    mesh.set_weights(weights, vertex_weights);
    mesh
}

/// Moves joint `index` to the given relative pose and recomposes the skeleton.
fn pose_joint(handler: &mut MeshHandler, index: usize, translation: Vec3, rotation: Quat) {
    let skeleton_handler = handler.skeleton_handler_mut().unwrap();
    skeleton_handler.joint_handlers_mut()[index].translation = translation;
    skeleton_handler.joint_handlers_mut()[index].rotation = rotation;
    skeleton_handler.calculate_states().unwrap();
}

// ============================================================================
// Weighted Skinning
// ============================================================================

#[test]
fn single_weight_vertex_uses_joint_transform() {
    let local = Vec3::new(1.0, 2.0, 0.5);
    let mesh = skinned_mesh(
        tangent_space_buffer(&[local]),
        vec![Weight::new(0, 1.0)],
        vec![VertexWeights::new(&[0])],
    );
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::new(0.0, 0.0, 3.0), Quat::from_rotation_z(FRAC_PI_2));

    skin_mesh(&handler).unwrap();

    let joint = handler.skeleton_handler().unwrap().joint_handlers()[0];
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(
        position(out, 0),
        joint.transform() * local + joint.translation_joint_space()
    ));
    assert!(approx_vec3(position(out, 0), Vec3::new(-2.0, 1.0, 3.5)));
    // Directions are rotated but not translated
    assert!(approx_vec3(attribute(out, VertexSemantic::Normal, 0), Vec3::Z));
    assert!(approx_vec3(attribute(out, VertexSemantic::Tangent, 0), Vec3::Y));
    assert!(approx_vec3(attribute(out, VertexSemantic::Binormal, 0), -Vec3::X));
}

#[test]
fn multiple_weights_are_blended_by_bias() {
    let mesh = skinned_mesh(
        tangent_space_buffer(&[Vec3::ZERO]),
        vec![Weight::new(0, 0.25), Weight::new(1, 0.75)],
        vec![VertexWeights::new(&[0, 1])],
    );
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 1, Vec3::new(4.0, 0.0, 0.0), Quat::IDENTITY);

    skin_mesh(&handler).unwrap();
    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 0), Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
fn vertices_without_weights_keep_morphed_position() {
    let mesh = skinned_mesh(
        tangent_space_buffer(&[Vec3::ONE, Vec3::ONE]),
        vec![Weight::new(0, 1.0)],
        vec![VertexWeights::new(&[0]), VertexWeights::default()],
    );
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::new(0.0, 5.0, 0.0), Quat::IDENTITY);

    skin_mesh(&handler).unwrap();
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(position(out, 0), Vec3::new(1.0, 6.0, 1.0)));
    assert!(approx_vec3(position(out, 1), Vec3::ONE));
}

#[test]
fn dangling_joint_index_is_ignored() {
    let mesh = skinned_mesh(
        tangent_space_buffer(&[Vec3::X]),
        vec![Weight::new(7, 1.0), Weight::new(0, 1.0)],
        vec![VertexWeights::new(&[0, 1])],
    );
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::Y, Quat::IDENTITY);

    skin_mesh(&handler).unwrap();
    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 0), Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn generic_path_handles_tangent_without_normal() {
    let layout = VertexLayout::new()
        .with(VertexSemantic::Position)
        .with(VertexSemantic::TexCoord)
        .with(VertexSemantic::Tangent);
    let base = VertexBufferRef::from_floats("base", layout, &[1.0, 0.0, 0.0, 0.5, 0.5, 1.0, 0.0, 0.0]);
    let mesh = skinned_mesh(base, vec![Weight::new(0, 1.0)], vec![VertexWeights::new(&[0])]);
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::ZERO, Quat::from_rotation_z(FRAC_PI_2));

    skin_mesh(&handler).unwrap();
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(position(out, 0), Vec3::Y));
    assert!(approx_vec3(attribute(out, VertexSemantic::Tangent, 0), Vec3::Y));
}

#[test]
fn normal_and_binormal_layout_without_tangent() {
    let layout = VertexLayout::new()
        .with(VertexSemantic::Position)
        .with(VertexSemantic::Normal)
        .with(VertexSemantic::Binormal);
    let base = VertexBufferRef::from_floats("base", layout, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let mesh = skinned_mesh(base, vec![Weight::new(0, 1.0)], vec![VertexWeights::new(&[0])]);
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::ZERO, Quat::from_rotation_z(FRAC_PI_2));

    skin_mesh(&handler).unwrap();
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(position(out, 0), Vec3::Y));
    assert!(approx_vec3(attribute(out, VertexSemantic::Normal, 0), Vec3::Y));
    assert!(approx_vec3(attribute(out, VertexSemantic::Binormal, 0), -Vec3::X));
}

#[test]
fn position_only_layout() {
    let mesh = skinned_mesh(
        position_buffer("base", &[Vec3::X]),
        vec![Weight::new(0, 1.0)],
        vec![VertexWeights::new(&[0])],
    );
    let mut handler = handler_for(mesh);
    pose_joint(&mut handler, 0, Vec3::Z, Quat::IDENTITY);

    skin_mesh(&handler).unwrap();
    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 0), Vec3::new(1.0, 0.0, 1.0)));
}

#[test]
fn skeleton_without_vertex_weights_fails() {
    let mesh = skinned_mesh(tangent_space_buffer(&[Vec3::ZERO]), Vec::new(), Vec::new());
    let handler = handler_for(mesh);
    assert_eq!(
        skin_mesh(&handler),
        Err(MeshError::MissingVertexWeights("character".to_string()))
    );
    assert!(!handler.vertex_buffer().unwrap().is_locked());
}

// ============================================================================
// Morph Targets
// ============================================================================

fn morph_mesh() -> Mesh {
    let mut mesh = Mesh::new("face");
    mesh.add_morph_target(MeshMorphTarget::new(
        "base",
        position_buffer("base", &[Vec3::ZERO, Vec3::X, Vec3::Y]),
    ));
    mesh.add_morph_target(MeshMorphTarget::relative(
        "smile",
        position_buffer("smile", &[Vec3::Z, Vec3::Z, Vec3::Z]),
    ));
    mesh.add_morph_target(MeshMorphTarget::sparse(
        "blink",
        position_buffer("blink", &[Vec3::new(0.0, -2.0, 0.0)]),
        vec![2],
    ));
    mesh
}

#[test]
fn dense_and_sparse_morph_targets_are_weighted() {
    let mut handler = handler_for(morph_mesh());
    handler.morph_target_weights_mut()[1] = 0.5;
    handler.morph_target_weights_mut()[2] = 0.25;

    skin_mesh(&handler).unwrap();
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(position(out, 0), Vec3::new(0.0, 0.0, 0.5)));
    assert!(approx_vec3(position(out, 1), Vec3::new(1.0, 0.0, 0.5)));
    assert!(approx_vec3(position(out, 2), Vec3::new(0.0, 0.5, 0.5)));
}

#[test]
fn base_morph_target_weight_is_ignored() {
    let mut handler = handler_for(morph_mesh());
    handler.morph_target_weights_mut()[0] = 5.0;

    skin_mesh(&handler).unwrap();
    let out = handler.vertex_buffer().unwrap();
    assert!(approx_vec3(position(out, 1), Vec3::X));
    assert!(approx_vec3(position(out, 2), Vec3::Y));
}

#[test]
fn locked_morph_target_is_skipped() {
    let mut handler = handler_for(morph_mesh());
    handler.morph_target_weights_mut()[1] = 1.0;
    let smile = handler.mesh().unwrap().morph_target(1).unwrap().vertex_buffer.clone().unwrap();

    let guard = smile.lock_write().unwrap();
    skin_mesh(&handler).unwrap();
    drop(guard);

    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 1), Vec3::X));
}

#[test]
fn previous_frame_is_overwritten_from_base() {
    let mut handler = handler_for(morph_mesh());
    handler.morph_target_weights_mut()[1] = 1.0;
    skin_mesh(&handler).unwrap();
    skin_mesh(&handler).unwrap();
    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 0), Vec3::Z));
}

// ============================================================================
// Buffer Guards
// ============================================================================

#[test]
fn skinning_into_base_buffer_is_rejected() {
    let mesh = morph_mesh();
    let base = mesh.base_vertex_buffer().unwrap().clone();
    let mut handler = MeshHandler::with_mesh(Arc::new(mesh)).unwrap();
    handler.set_vertex_buffer(Some(base.clone()));

    assert_eq!(
        skin_mesh(&handler),
        Err(MeshError::BufferAliasing {
            label: "base".to_string()
        })
    );
    assert!(!base.is_locked());
    assert_eq!(base.version(), 0);
}

#[test]
fn locked_destination_fails_and_releases_source() {
    let handler = handler_for(morph_mesh());
    let destination = handler.vertex_buffer().unwrap().clone();
    let base = handler.mesh().unwrap().base_vertex_buffer().unwrap().clone();

    let guard = destination.lock_read().unwrap();
    assert!(matches!(skin_mesh(&handler), Err(MeshError::BufferLocked { .. })));
    drop(guard);

    assert!(!base.is_locked());
    assert!(!destination.is_locked());
    assert!(skin_mesh(&handler).is_ok());
}

#[test]
fn failed_skinning_leaves_previous_vertices() {
    let mut handler = handler_for(morph_mesh());
    handler.morph_target_weights_mut()[1] = 1.0;
    skin_mesh(&handler).unwrap();

    let base = handler.mesh().unwrap().base_vertex_buffer().unwrap().clone();
    handler.morph_target_weights_mut()[1] = 0.0;
    let guard = base.lock_write().unwrap();
    assert!(skin_mesh(&handler).is_err());
    drop(guard);

    assert!(approx_vec3(position(handler.vertex_buffer().unwrap(), 0), Vec3::Z));
}
