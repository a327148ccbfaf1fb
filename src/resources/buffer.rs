//! Vertex Buffers
//!
//! CPU-side vertex storage with an explicit, scoped lock discipline.
//!
//! A [`VertexBufferRef`] is a cheap shared handle; identity (used for the
//! skinning aliasing guard) is the buffer id, not the contents. Access goes
//! through [`VertexBufferRef::lock_read`] / [`VertexBufferRef::lock_write`],
//! which hand out guards that release the lock when dropped, so every early
//! return unlocks automatically. Dropping a write guard bumps the buffer
//! version.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::SmallVec;

use crate::errors::{MeshError, Result};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();
const VEC3_SIZE: usize = 3 * FLOAT_SIZE;

// ============================================================================
// Layout
// ============================================================================

/// Meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    Normal,
    Tangent,
    Binormal,
    TexCoord,
}

impl VertexSemantic {
    /// Number of `f32` components stored for this attribute.
    #[inline]
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            Self::TexCoord => 2,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: VertexSemantic,
    /// Byte offset inside one vertex
    pub offset: usize,
}

/// Interleaved vertex layout. Attributes are packed in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: SmallVec<[VertexAttribute; 5]>,
    stride: usize,
}

impl VertexLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. Adding a semantic twice is ignored.
    #[must_use]
    pub fn with(mut self, semantic: VertexSemantic) -> Self {
        if self.offset(semantic).is_none() {
            self.attributes.push(VertexAttribute {
                semantic,
                offset: self.stride,
            });
            self.stride += semantic.components() * FLOAT_SIZE;
        }
        self
    }

    /// Position only.
    #[must_use]
    pub fn position() -> Self {
        Self::new().with(VertexSemantic::Position)
    }

    /// Position, normal, tangent and binormal.
    #[must_use]
    pub fn tangent_space() -> Self {
        Self::new()
            .with(VertexSemantic::Position)
            .with(VertexSemantic::Normal)
            .with(VertexSemantic::Tangent)
            .with(VertexSemantic::Binormal)
    }

    #[inline]
    #[must_use]
    pub fn offset(&self, semantic: VertexSemantic) -> Option<usize> {
        self.attributes
            .iter()
            .find(|a| a.semantic == semantic)
            .map(|a| a.offset)
    }

    #[inline]
    #[must_use]
    pub fn has(&self, semantic: VertexSemantic) -> bool {
        self.offset(semantic).is_some()
    }

    /// Size of one vertex in bytes.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }
}

// ============================================================================
// Buffer
// ============================================================================

/// Requested access for a buffer lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug)]
pub struct VertexBuffer {
    id: u64,
    label: String,
    layout: VertexLayout,
    num_vertices: usize,
    version: AtomicU64,
    data: RwLock<Vec<u8>>,
}

/// Shared vertex buffer handle, compared and hashed by buffer id.
#[derive(Debug, Clone)]
pub struct VertexBufferRef(Arc<VertexBuffer>);

impl PartialEq for VertexBufferRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for VertexBufferRef {}

impl std::hash::Hash for VertexBufferRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl VertexBufferRef {
    /// Creates a zero-filled buffer holding `num_vertices` vertices.
    #[must_use]
    pub fn new(label: &str, layout: VertexLayout, num_vertices: usize) -> Self {
        let data = vec![0u8; layout.stride() * num_vertices];
        Self::from_parts(label, layout, num_vertices, data)
    }

    /// Creates a buffer from interleaved `f32` data matching `layout`.
    ///
    /// Trailing floats that do not fill a whole vertex are dropped.
    #[must_use]
    pub fn from_floats(label: &str, layout: VertexLayout, floats: &[f32]) -> Self {
        let stride = layout.stride();
        let mut data: Vec<u8> = bytemuck::cast_slice(floats).to_vec();
        let num_vertices = if stride == 0 { 0 } else { data.len() / stride };
        data.truncate(num_vertices * stride);
        Self::from_parts(label, layout, num_vertices, data)
    }

    fn from_parts(label: &str, layout: VertexLayout, num_vertices: usize, data: Vec<u8>) -> Self {
        Self(Arc::new(VertexBuffer {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            layout,
            num_vertices,
            version: AtomicU64::new(0),
            data: RwLock::new(data),
        }))
    }

    /// Deep copy with a fresh id. Fails if the source is write-locked.
    pub fn duplicate(&self, label: &str) -> Result<Self> {
        let source = self.lock_read()?;
        let data = source.bytes().to_vec();
        Ok(Self::from_parts(
            label,
            self.0.layout.clone(),
            self.0.num_vertices,
            data,
        ))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &VertexLayout {
        &self.0.layout
    }

    #[inline]
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.0.num_vertices
    }

    #[inline]
    #[must_use]
    pub fn vertex_size(&self) -> usize {
        self.0.layout.stride()
    }

    /// Incremented every time a write lock is released.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.load(Ordering::Relaxed)
    }

    /// `true` while any lock is held on the buffer.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.0.data.is_locked()
    }

    /// Locks the buffer for reading. Fails while a write lock is held.
    pub fn lock_read(&self) -> Result<VertexReadLock<'_>> {
        let data = self.0.data.try_read().ok_or_else(|| MeshError::BufferLocked {
            label: self.0.label.clone(),
            mode: LockMode::ReadOnly,
        })?;
        Ok(VertexReadLock {
            buffer: &self.0,
            data,
        })
    }

    /// Locks the buffer for reading and writing. Fails while any lock is held.
    pub fn lock_write(&self) -> Result<VertexWriteLock<'_>> {
        let data = self.0.data.try_write().ok_or_else(|| MeshError::BufferLocked {
            label: self.0.label.clone(),
            mode: LockMode::ReadWrite,
        })?;
        Ok(VertexWriteLock {
            buffer: &self.0,
            data,
        })
    }
}

// ============================================================================
// Lock Guards
// ============================================================================

/// Read-only access to a locked vertex buffer. Unlocks on drop.
pub struct VertexReadLock<'a> {
    buffer: &'a VertexBuffer,
    data: RwLockReadGuard<'a, Vec<u8>>,
}

impl VertexReadLock<'_> {
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.buffer.num_vertices
    }

    #[inline]
    #[must_use]
    pub fn vertex_size(&self) -> usize {
        self.buffer.layout.stride()
    }

    #[inline]
    #[must_use]
    pub fn attribute_offset(&self, semantic: VertexSemantic) -> Option<usize> {
        self.buffer.layout.offset(semantic)
    }

    /// Reads a three component attribute of `vertex`.
    #[must_use]
    pub fn vec3(&self, semantic: VertexSemantic, vertex: usize) -> Option<Vec3> {
        let offset = attribute_byte_offset(self.buffer, semantic, vertex)?;
        Some(read_vec3(&self.data, offset))
    }
}

/// Read-write access to a locked vertex buffer. Unlocks on drop and bumps
/// the buffer version.
pub struct VertexWriteLock<'a> {
    buffer: &'a VertexBuffer,
    data: RwLockWriteGuard<'a, Vec<u8>>,
}

impl VertexWriteLock<'_> {
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.buffer.num_vertices
    }

    #[inline]
    #[must_use]
    pub fn vertex_size(&self) -> usize {
        self.buffer.layout.stride()
    }

    #[inline]
    #[must_use]
    pub fn attribute_offset(&self, semantic: VertexSemantic) -> Option<usize> {
        self.buffer.layout.offset(semantic)
    }

    #[must_use]
    pub fn vec3(&self, semantic: VertexSemantic, vertex: usize) -> Option<Vec3> {
        let offset = attribute_byte_offset(self.buffer, semantic, vertex)?;
        Some(read_vec3(&self.data, offset))
    }

    /// Writes a three component attribute of `vertex`.
    pub fn set_vec3(&mut self, semantic: VertexSemantic, vertex: usize, value: Vec3) -> Result<()> {
        let offset = attribute_byte_offset(self.buffer, semantic, vertex).ok_or_else(|| {
            MeshError::MissingAttribute {
                label: self.buffer.label.clone(),
                semantic,
            }
        })?;
        write_vec3(&mut self.data, offset, value);
        Ok(())
    }
}

impl Drop for VertexWriteLock<'_> {
    fn drop(&mut self) {
        self.buffer.version.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// Raw Access Helpers
// ============================================================================

fn attribute_byte_offset(buffer: &VertexBuffer, semantic: VertexSemantic, vertex: usize) -> Option<usize> {
    if vertex >= buffer.num_vertices || semantic.components() != 3 {
        return None;
    }
    let offset = buffer.layout.offset(semantic)?;
    Some(vertex * buffer.layout.stride() + offset)
}

/// Reads three floats starting at `offset`.
#[inline]
pub(crate) fn read_vec3(bytes: &[u8], offset: usize) -> Vec3 {
    let v: [f32; 3] = bytemuck::pod_read_unaligned(&bytes[offset..offset + VEC3_SIZE]);
    Vec3::from_array(v)
}

/// Writes three floats starting at `offset`.
#[inline]
pub(crate) fn write_vec3(bytes: &mut [u8], offset: usize, value: Vec3) {
    bytes[offset..offset + VEC3_SIZE].copy_from_slice(bytemuck::bytes_of(&value.to_array()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_packs_attributes_in_order() {
        let layout = VertexLayout::new()
            .with(VertexSemantic::Position)
            .with(VertexSemantic::TexCoord)
            .with(VertexSemantic::Normal);
        assert_eq!(layout.offset(VertexSemantic::Position), Some(0));
        assert_eq!(layout.offset(VertexSemantic::TexCoord), Some(12));
        assert_eq!(layout.offset(VertexSemantic::Normal), Some(20));
        assert_eq!(layout.stride(), 32);
        assert!(!layout.has(VertexSemantic::Tangent));
    }

    #[test]
    fn write_lock_bumps_version_on_drop() {
        let buffer = VertexBufferRef::new("vb", VertexLayout::position(), 2);
        assert_eq!(buffer.version(), 0);
        {
            let mut lock = buffer.lock_write().unwrap();
            lock.set_vec3(VertexSemantic::Position, 1, Vec3::new(1.0, 2.0, 3.0))
                .unwrap();
            assert_eq!(buffer.version(), 0);
        }
        assert_eq!(buffer.version(), 1);
        let lock = buffer.lock_read().unwrap();
        assert_eq!(
            lock.vec3(VertexSemantic::Position, 1),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn conflicting_locks_fail_instead_of_blocking() {
        let buffer = VertexBufferRef::new("vb", VertexLayout::position(), 1);
        let read = buffer.lock_read().unwrap();
        assert!(buffer.lock_read().is_ok());
        assert!(matches!(
            buffer.lock_write(),
            Err(MeshError::BufferLocked {
                mode: LockMode::ReadWrite,
                ..
            })
        ));
        drop(read);
        assert!(!buffer.is_locked());
        assert!(buffer.lock_write().is_ok());
    }

    #[test]
    fn duplicate_has_new_identity_and_same_contents() {
        let buffer = VertexBufferRef::from_floats("vb", VertexLayout::position(), &[1.0, 2.0, 3.0]);
        let copy = buffer.duplicate("copy").unwrap();
        assert_ne!(buffer, copy);
        assert_eq!(copy.num_vertices(), 1);
        assert_eq!(
            copy.lock_read().unwrap().vec3(VertexSemantic::Position, 0),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let buffer = VertexBufferRef::new("vb", VertexLayout::position(), 1);
        let mut lock = buffer.lock_write().unwrap();
        assert!(lock.vec3(VertexSemantic::Position, 1).is_none());
        assert!(lock.set_vec3(VertexSemantic::Normal, 0, Vec3::ONE).is_err());
    }
}
