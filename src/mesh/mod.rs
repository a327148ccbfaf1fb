//! Mesh instances and their animation strategies.
//!
//! A [`MeshHandler`] binds one shared [`Mesh`](crate::resources::Mesh) and
//! drives it through a [`MeshAnimationManager`]:
//!
//! ```text
//! MeshHandler::update(dt)
//!   └─ MeshAnimationManager::update(dt)      advance playback
//!   └─ MeshAnimationManager::apply(handler)  when a frame changed
//!        ├─ reset, sample and compose joint states
//!        └─ (software) skin into the private vertex buffer
//! ```

pub mod animation_manager;
pub mod handler;
pub mod registry;
pub mod software;

pub use animation_manager::{
    AnimationManagerState, BasicMeshAnimationManager, MeshAnimationManager, apply_animation_states,
};
pub use handler::MeshHandler;
pub use registry::{AnimationManagerRegistry, ManagerConstructor};
pub use software::{SoftwareMeshAnimationManager, skin_mesh};
