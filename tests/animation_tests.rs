//! Animation System Tests
//!
//! Tests for:
//! - Interpolatable trait implementations (f32, Vec3, Quat)
//! - AnimationInfo frame ranges and per-frame speed tables
//! - Animation playback (forward, reverse, loop, ping-pong, pause)
//! - MorphTargetAni frame keys and weight application
//! - Animation manager playback lists

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use pl_mesh::animation::{
    Animation, AnimationFlags, AnimationInfo, AnimationKind, DEFAULT_FRAME_SPEED, Interpolatable,
    MorphTargetAni,
};
use pl_mesh::errors::MeshError;
use pl_mesh::mesh::{BasicMeshAnimationManager, MeshAnimationManager};
use pl_mesh::resources::{Mesh, MeshMorphTarget, VertexBufferRef, VertexLayout};
use pl_mesh::settings::AnimationSettings;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Interpolatable
// ============================================================================

#[test]
fn interpolate_f32() {
    assert!(approx(f32::interpolate_linear(2.0, 4.0, 0.25), 2.5));
}

#[test]
fn interpolate_vec3() {
    let v = Vec3::interpolate_linear(Vec3::ZERO, Vec3::new(2.0, -4.0, 8.0), 0.5);
    assert!((v - Vec3::new(1.0, -2.0, 4.0)).length() < EPSILON);
}

#[test]
fn interpolate_quat_is_slerp() {
    let q = Quat::interpolate_linear(Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2), 0.5);
    let expected = Quat::from_rotation_z(FRAC_PI_2 / 2.0);
    assert!(q.dot(expected).abs() > 1.0 - EPSILON);
    assert!(approx(q.length(), 1.0));
}

// ============================================================================
// AnimationInfo
// ============================================================================

#[test]
fn info_defaults() {
    let info = AnimationInfo::new("idle", AnimationKind::Skeleton);
    assert_eq!(info.speed, DEFAULT_FRAME_SPEED);
    assert_eq!(info.flags, AnimationFlags::empty());
    assert_eq!(info.num_frames(), 0);
}

#[test]
fn info_reversed_range_counts_frames() {
    let info = AnimationInfo::new("rewind", AnimationKind::Vertex).with_frames(5, 2);
    assert_eq!(info.num_frames(), 3);
}

#[test]
fn frame_speed_table_is_padded() {
    let mut info = AnimationInfo::new("walk", AnimationKind::Skeleton);
    assert_eq!(info.frame_speed(0), None);

    info.set_frame_speed(3, 0.5);
    assert_eq!(info.frame_speed(1), Some(1.0));
    assert_eq!(info.frame_speed(3), Some(0.5));
    assert_eq!(info.frame_speed(4), None);
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn new_animation_is_inactive() {
    let animation = Animation::new("walk");
    assert!(!animation.is_active());
    assert!(!animation.is_running());
    assert_eq!(animation.weight(), 1.0);
    assert_eq!(animation.speed(), DEFAULT_FRAME_SPEED);
}

#[test]
fn reverse_loop_wraps_to_upper_end() {
    let mut animation = Animation::new("walk");
    animation.start(0, 4, -1.0, AnimationFlags::LOOP);

    assert!(animation.update(0.5));
    assert!(approx(animation.frame(), 3.5));
    assert_eq!(animation.current_frame(), 4);
    assert_eq!(animation.next_frame(), 3);
    assert!(approx(animation.progress(), 0.5));
}

#[test]
fn looping_ping_pong_keeps_bouncing() {
    let mut animation = Animation::new("swing");
    animation.start(0, 2, 1.0, AnimationFlags::LOOP | AnimationFlags::PING_PONG);

    animation.update(2.5);
    assert_eq!(animation.frame(), 2.0);
    assert!(animation.speed() < 0.0);

    animation.update(2.5);
    assert_eq!(animation.frame(), 0.0);
    assert!(animation.speed() > 0.0);
    assert!(animation.is_active());
}

#[test]
fn zero_frame_speed_skips_frame() {
    let mut info = AnimationInfo::new("blink", AnimationKind::Vertex)
        .with_frames(0, 3)
        .with_speed(1.0);
    info.set_frame_speed(0, 0.0);

    let mut animation = Animation::new("blink");
    animation.start_with_info(&info, true);

    assert!(animation.update(0.01));
    assert_eq!(animation.frame(), 1.0);
    animation.update(0.25);
    assert!(approx(animation.frame(), 1.25));
}

#[test]
fn frame_speed_scales_playback() {
    let mut info = AnimationInfo::new("run", AnimationKind::Skeleton)
        .with_frames(0, 3)
        .with_speed(1.0);
    info.set_frame_speed(0, 2.0);

    let mut animation = Animation::new("run");
    animation.start_with_info(&info, true);
    animation.update(0.25);
    assert!(approx(animation.frame(), 0.5));
    assert_eq!(animation.kind(), AnimationKind::Skeleton);
}

#[test]
fn pause_and_resume() {
    let mut animation = Animation::new("walk");
    animation.start(0, 4, 1.0, AnimationFlags::empty());

    animation.pause();
    assert!(!animation.update(1.0));
    assert!(animation.is_active());

    animation.resume();
    assert!(animation.update(1.0));
    assert_eq!(animation.current_frame(), 1);
}

#[test]
fn single_frame_range_never_advances() {
    let mut animation = Animation::new("pose");
    animation.start(2, 2, 1.0, AnimationFlags::LOOP);
    assert!(!animation.update(1.0));
    assert_eq!(animation.next_frame(), 2);

    animation.pause();
    animation.resume();
    assert!(!animation.is_running());
}

#[test]
fn set_current_frame_clamps_to_range() {
    let mut animation = Animation::new("walk");
    animation.start(2, 6, 1.0, AnimationFlags::empty());

    assert!(animation.set_current_frame(10.0));
    assert_eq!(animation.current_frame(), 6);
    assert!(!animation.set_current_frame(6.0));
    assert!(animation.set_current_frame(0.0));
    assert_eq!(animation.current_frame(), 2);
}

#[test]
fn stop_and_reset() {
    let mut animation = Animation::new("walk");
    animation.start(0, 4, 2.0, AnimationFlags::LOOP);
    animation.set_weight(0.5);

    animation.stop();
    assert!(!animation.is_active());
    assert!(!animation.is_running());

    animation.reset();
    assert_eq!(animation.name(), "walk");
    assert_eq!(animation.weight(), 1.0);
    assert_eq!(animation.flags(), AnimationFlags::empty());
}

// ============================================================================
// MorphTargetAni
// ============================================================================

fn face() -> Mesh {
    let mut mesh = Mesh::new("face");
    mesh.add_morph_target(MeshMorphTarget::new(
        "base",
        VertexBufferRef::new("base", VertexLayout::position(), 1),
    ));
    mesh.add_morph_target(MeshMorphTarget::relative(
        "eye_r",
        VertexBufferRef::new("eye_r", VertexLayout::position(), 1),
    ));
    mesh
}

fn blink() -> MorphTargetAni {
    let mut blink = MorphTargetAni::new("blink", vec!["eye_l".to_string(), "eye_r".to_string()]);
    blink.push_frame(vec![1.0]);
    blink.push_frame(vec![0.0, 1.0, 9.0]);
    blink
}

#[test]
fn morph_frames_are_sized_to_targets() {
    let blink = blink();
    assert_eq!(blink.num_frames(), 2);
    assert_eq!(blink.info().end_frame, 1);
    assert_eq!(blink.info().kind, AnimationKind::Vertex);
}

#[test]
fn morph_weights_are_matched_by_name() {
    let mesh = face();
    let mut weights = vec![0.0, 0.25];

    blink()
        .apply_morph_target_weights(&mesh, &mut weights, 0, 1, 0.5, 2.0)
        .unwrap();

    assert_eq!(weights[0], 0.0);
    assert!(approx(weights[1], 1.25));
}

#[test]
fn morph_frame_out_of_range() {
    let mesh = face();
    let mut weights = vec![0.0; 2];
    assert_eq!(
        blink().apply_morph_target_weights(&mesh, &mut weights, 0, 2, 0.5, 1.0),
        Err(MeshError::FrameOutOfRange { frame: 2, frames: 2 })
    );
    assert_eq!(weights, vec![0.0; 2]);
}

// ============================================================================
// Manager Playback List
// ============================================================================

#[test]
fn manager_reuses_playback_state_per_name() {
    let mut manager = BasicMeshAnimationManager::new(AnimationSettings::default());
    let info = AnimationInfo::new("walk", AnimationKind::Skeleton).with_frames(0, 8);

    manager.state_mut().start(&info, true);
    manager.state_mut().add_animation("walk");
    assert_eq!(manager.state().animations().len(), 1);
    assert!(manager.state().animation("walk").unwrap().is_active());

    assert!(manager.update(0.1));
    assert!(manager.state().animation("walk").unwrap().frame() > 0.0);

    assert!(manager.state_mut().remove_animation("walk").is_some());
    assert!(!manager.update(0.1));
}

#[test]
fn manager_update_reports_any_change() {
    let mut manager = BasicMeshAnimationManager::new(AnimationSettings::default());
    let idle = AnimationInfo::new("idle", AnimationKind::Vertex);
    let walk = AnimationInfo::new("walk", AnimationKind::Skeleton).with_frames(0, 8);

    manager.state_mut().start(&idle, true);
    manager.state_mut().start(&walk, true);
    assert!(manager.update(0.1));

    manager.state_mut().clear();
    assert!(manager.state().animations().is_empty());
}
