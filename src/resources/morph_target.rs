use crate::resources::buffer::VertexBufferRef;

/// One morph target (blend shape) of a mesh.
///
/// Morph target 0 of a mesh is the base: its buffer holds the full rest
/// vertex set that skinning reads from. Every other relative target stores
/// position deltas, either for all vertices or, when `vertex_ids` is not
/// empty, for the listed vertices only (delta `i` belongs to `vertex_ids[i]`).
#[derive(Debug, Clone)]
pub struct MeshMorphTarget {
    pub name: String,
    /// `true` if the buffer holds deltas relative to the base
    pub relative: bool,
    pub vertex_buffer: Option<VertexBufferRef>,
    pub vertex_ids: Vec<u32>,
}

impl MeshMorphTarget {
    #[must_use]
    pub fn new(name: &str, vertex_buffer: VertexBufferRef) -> Self {
        Self {
            name: name.to_string(),
            relative: false,
            vertex_buffer: Some(vertex_buffer),
            vertex_ids: Vec::new(),
        }
    }

    /// Dense relative target: one delta per base vertex.
    #[must_use]
    pub fn relative(name: &str, deltas: VertexBufferRef) -> Self {
        Self {
            relative: true,
            ..Self::new(name, deltas)
        }
    }

    /// Sparse relative target: one delta per listed vertex.
    #[must_use]
    pub fn sparse(name: &str, deltas: VertexBufferRef, vertex_ids: Vec<u32>) -> Self {
        Self {
            relative: true,
            vertex_ids,
            ..Self::new(name, deltas)
        }
    }
}
