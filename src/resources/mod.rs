//! Mesh data shared between mesh handlers.
//!
//! - [`VertexBufferRef`]: lockable CPU vertex storage
//! - [`Mesh`]: morph targets, skinning weights and animation lookup
//! - [`ResourceManager`]: name addressed, reference counted storage

pub mod bounds;
pub mod buffer;
pub mod manager;
pub mod mesh;
pub mod morph_target;
pub mod weight;

pub use bounds::BoundingBox;
pub use buffer::{LockMode, VertexBufferRef, VertexLayout, VertexSemantic};
pub use manager::{Resource, ResourceManager};
pub use mesh::Mesh;
pub use morph_target::MeshMorphTarget;
pub use weight::{VertexWeights, Weight};
