//! GPU mesh description.
//!
//! A [`Mesh`] is what the command buffer needs to issue a draw: the topology,
//! per-LOD element counts with their vertex array, and an optional buffer that
//! receives per-instance transforms for instanced draws.

pub use ember_core::mesh::PrimitiveTopology;

use crate::backend::{BufferHandle, DrawCall, VertexArrayHandle};

/// One level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lod {
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of indices.
    pub index_count: u32,
    /// Vertex array binding vertex and index buffers.
    pub vertex_array: VertexArrayHandle,
}

/// A mesh uploaded to the GPU.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    topology: PrimitiveTopology,
    lods: Vec<Lod>,
    instance_buffer: Option<BufferHandle>,
    label: Option<String>,
}

impl Mesh {
    /// Create a mesh with no LODs.
    pub fn new(topology: PrimitiveTopology) -> Self {
        Self {
            topology,
            ..Self::default()
        }
    }

    /// Append a level of detail.
    #[must_use]
    pub fn with_lod(mut self, lod: Lod) -> Self {
        self.lods.push(lod);
        self
    }

    /// Set the buffer receiving per-instance transforms.
    #[must_use]
    pub fn with_instance_buffer(mut self, buffer: BufferHandle) -> Self {
        self.instance_buffer = Some(buffer);
        self
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get a level of detail.
    pub fn lod(&self, index: usize) -> Option<&Lod> {
        self.lods.get(index)
    }

    /// Get all levels of detail.
    pub fn lods(&self) -> &[Lod] {
        &self.lods
    }

    /// Get the per-instance transform buffer.
    pub fn instance_buffer(&self) -> Option<BufferHandle> {
        self.instance_buffer
    }

    /// Get the label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Build the draw call for a level of detail.
    ///
    /// List topologies draw `index_count` indices, strips and fans draw
    /// `vertex_count` vertices.
    pub fn draw_call(&self, lod: usize, instances: u32) -> Option<DrawCall> {
        let lod = self.lods.get(lod)?;
        let elements = if self.topology.is_indexed() {
            lod.index_count
        } else {
            lod.vertex_count
        };
        Some(DrawCall {
            topology: self.topology,
            elements,
            instances,
        })
    }
}
