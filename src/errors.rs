//! Error Types
//!
//! This module defines the error type used throughout the animation core.
//!
//! # Overview
//!
//! [`MeshError`] covers every way a per-frame update can be skipped:
//! - Missing resources (no mesh, no skeleton, no vertex data)
//! - Vertex buffer lock failures and invalid buffer aliasing
//! - Invalid animation data (frames out of range, unknown animations)
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, MeshError>`. An `Err` always means "this frame's
//! update was skipped and the previous state is untouched"; no operation in
//! this crate leaves partially written data behind on failure.
//!
//! ```rust,ignore
//! use pl_mesh::errors::Result;
//!
//! fn tick(handler: &mut MeshHandler, dt: f32) -> Result<()> {
//!     handler.update(dt, 0)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::resources::buffer::{LockMode, VertexSemantic};

/// The main error type for mesh animation and skinning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    // ========================================================================
    // Missing Resources
    // ========================================================================
    /// The mesh handler has no mesh bound.
    #[error("Mesh handler has no mesh")]
    MissingMesh,

    /// The skeleton handler has no skeleton bound.
    #[error("Skeleton handler has no skeleton")]
    MissingSkeleton,

    /// The mesh handler has no mesh animation manager.
    #[error("Mesh handler has no animation manager")]
    MissingAnimationManager,

    /// A morph target required for the operation does not exist.
    #[error("Morph target not found: {0}")]
    MissingMorphTarget(String),

    /// A vertex buffer required for the operation does not exist.
    #[error("Vertex buffer missing: {0}")]
    MissingVertexBuffer(&'static str),

    /// Skinning was requested for a mesh without per-vertex weights.
    #[error("Mesh '{0}' has a skeleton but no vertex weights")]
    MissingVertexWeights(String),

    /// A vertex attribute is not part of the buffer layout.
    #[error("Vertex attribute {semantic:?} missing in buffer '{label}'")]
    MissingAttribute {
        /// Label of the buffer that was queried
        label: String,
        /// The requested attribute
        semantic: VertexSemantic,
    },

    // ========================================================================
    // Buffer Access
    // ========================================================================
    /// The buffer is already locked in a way that conflicts with the request.
    #[error("Vertex buffer '{label}' could not be locked for {mode:?} access")]
    BufferLocked {
        /// Label of the buffer
        label: String,
        /// The requested access mode
        mode: LockMode,
    },

    /// Skinning source and destination are the same buffer.
    #[error("Vertex buffer '{label}' cannot be skinned into itself")]
    BufferAliasing {
        /// Label of the shared buffer
        label: String,
    },

    // ========================================================================
    // Animation Data
    // ========================================================================
    /// A frame index beyond the available frame keys was requested.
    #[error("Frame {frame} out of range ({frames} frames available)")]
    FrameOutOfRange {
        /// The requested frame
        frame: u32,
        /// Number of frames the animation provides
        frames: u32,
    },

    /// No skeleton or morph target animation with this name is known to the mesh.
    #[error("Animation not found: {0}")]
    MissingAnimation(String),

    /// No animation manager is registered under the given key.
    #[error("Unknown mesh animation manager: {0}")]
    UnknownAnimationManager(String),

    /// Vertex weights failed validation under the `Reject` policy.
    #[error("Vertex {vertex} has weight sum {sum}, expected 1.0")]
    InvalidVertexWeights {
        /// Index of the first offending vertex
        vertex: usize,
        /// Sum of the vertex biases
        sum: f32,
    },
}

/// Alias for `Result<T, MeshError>`.
pub type Result<T> = std::result::Result<T, MeshError>;
