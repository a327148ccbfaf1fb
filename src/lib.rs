//! Skeletal mesh animation and CPU skinning.
//!
//! - [`skeleton`]: joint hierarchies, bind poses and per-instance joint states
//! - [`animation`]: frame based playback and morph target animation data
//! - [`resources`]: vertex buffers, meshes and shared resource managers
//! - [`mesh`]: mesh handlers and their animation strategies, including
//!   software skinning

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod errors;
pub mod mesh;
pub mod resources;
pub mod settings;
pub mod skeleton;

pub use animation::{Animation, AnimationFlags, AnimationInfo, AnimationKind, MorphTargetAni, MorphTargetAniManager};
pub use errors::{MeshError, Result};
pub use mesh::{
    AnimationManagerRegistry, BasicMeshAnimationManager, MeshAnimationManager, MeshHandler,
    SoftwareMeshAnimationManager,
};
pub use resources::{
    BoundingBox, Mesh, MeshMorphTarget, VertexBufferRef, VertexLayout, VertexSemantic, VertexWeights, Weight,
};
pub use settings::{AnimationSettings, SkinningBackend, WeightValidation};
pub use skeleton::{AnimatedComponents, Joint, JointHandler, Skeleton, SkeletonHandler, SkeletonManager};
