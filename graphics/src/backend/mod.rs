//! Graphics API abstraction layer.
//!
//! This module defines [`GraphicsApi`], the exact set of calls the material
//! binding protocol issues, and the opaque handle types those calls exchange.
//!
//! # Available Backends
//!
//! - `dummy` (default): records calls and state, for tests and headless runs
//! - `gl-backend`: OpenGL via `glow`
//!
//! # Threading
//!
//! Graphics contexts are bound to one thread. `GraphicsApi` is deliberately
//! not `Send`/`Sync`: it is passed by reference into the calls that need it
//! and never stored inside shared resources. Objects that outlive a frame on
//! other threads (materials) hand their GPU handles back through
//! [`DeferredReleases`] instead of deleting them directly.

mod deferred;
pub mod dummy;

#[cfg(feature = "gl-backend")]
pub mod gl;

pub use deferred::DeferredReleases;
pub use dummy::DummyBackend;

#[cfg(feature = "gl-backend")]
pub use gl::GlBackend;

use ember_core::math::Vec4;
use ember_core::mesh::PrimitiveTopology;
use ember_core::uniform::UniformData;

use crate::error::GraphicsError;
use crate::pipeline::PipelineState;
use crate::resources::Texture;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw backend id.
            pub fn raw(&self) -> u32 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Handle to a compiled shader stage.
    ShaderHandle
);
define_handle!(
    /// Handle to a linked shader program.
    ProgramHandle
);
define_handle!(
    /// Handle to a GPU texture.
    TextureHandle
);
define_handle!(
    /// Handle to a vertex array (vertex/index buffer bindings).
    VertexArrayHandle
);
define_handle!(
    /// Handle to a GPU buffer.
    BufferHandle
);
define_handle!(
    /// Handle to a framebuffer object.
    FramebufferHandle
);
define_handle!(
    /// Location of a uniform inside the current program.
    UniformLocation
);

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

/// Texture binding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// 2D texture.
    #[default]
    Texture2d,
    /// Cube map.
    CubeMap,
}

/// A single draw submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// How elements are assembled into primitives.
    pub topology: PrimitiveTopology,
    /// Index count for indexed topologies, vertex count otherwise.
    pub elements: u32,
    /// Number of instances; 1 for a regular draw.
    pub instances: u32,
}

impl DrawCall {
    /// Returns `true` if the draw reads the bound index buffer.
    pub fn is_indexed(&self) -> bool {
        self.topology.is_indexed()
    }

    /// Number of polygons this draw produces across all instances.
    ///
    /// Saturates at `u32::MAX`.
    pub fn polygon_count(&self) -> u32 {
        self.topology
            .polygon_count(self.elements)
            .saturating_mul(self.instances)
    }

    /// Element and instance counts as the signed integers GL draw entry points take.
    ///
    /// `None` if either count exceeds `i32::MAX`.
    pub fn signed_counts(&self) -> Option<(i32, i32)> {
        let elements = i32::try_from(self.elements).ok()?;
        let instances = i32::try_from(self.instances).ok()?;
        Some((elements, instances))
    }
}

/// Integer rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Which attachments to clear, and to what.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearRequest {
    /// Clear color, if the color attachment is cleared.
    pub color: Option<Vec4>,
    /// Clear depth, if the depth attachment is cleared.
    pub depth: Option<f32>,
}

/// The graphics calls issued by the program cache and the command buffer.
///
/// Uniform uploads target the program made current by the last
/// [`use_program`](Self::use_program) call, matching immediate-mode APIs.
pub trait GraphicsApi {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Compile one shader stage.
    fn compile_shader(&self, stage: ShaderStage, source: &str)
    -> Result<ShaderHandle, GraphicsError>;

    /// Delete a shader stage. Programs already linked from it stay valid.
    fn delete_shader(&self, shader: ShaderHandle);

    /// Link a vertex and a fragment stage into a program.
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError>;

    /// Delete a program.
    fn delete_program(&self, program: ProgramHandle);

    /// Make a program current.
    fn use_program(&self, program: ProgramHandle);

    /// Look up a uniform by name in a program. `None` if the program has no such uniform.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Upload uniform data to the current program.
    fn set_uniform(&self, location: UniformLocation, data: UniformData<'_>);

    /// Apply depth, culling and blending.
    fn apply_pipeline_state(&self, state: &PipelineState);

    /// Bind a texture to a texture unit.
    fn bind_texture(&self, unit: u32, texture: &Texture);

    /// Bind a vertex array, or unbind with `None`.
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);

    /// Replace the contents of a buffer.
    fn upload_buffer(&self, buffer: BufferHandle, data: &[u8]);

    /// Issue a draw using the bound vertex array.
    fn draw(&self, call: &DrawCall);

    /// Bind a framebuffer at a mip level, or the default framebuffer with `None`.
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>, level: u32);

    /// Clear the bound framebuffer.
    fn clear(&self, request: &ClearRequest);

    /// Set the viewport rectangle.
    fn set_viewport(&self, viewport: Rect);

    /// Enable scissoring to a rectangle, or disable it with `None`.
    fn set_scissor(&self, scissor: Option<Rect>);

    /// Block until all submitted work has completed.
    fn finish(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_call_polygons() {
        let call = DrawCall {
            topology: PrimitiveTopology::TriangleList,
            elements: 36,
            instances: 4,
        };
        assert!(call.is_indexed());
        assert_eq!(call.polygon_count(), 48);

        let strip = DrawCall {
            topology: PrimitiveTopology::TriangleStrip,
            elements: 4,
            instances: 1,
        };
        assert!(!strip.is_indexed());
        assert_eq!(strip.polygon_count(), 2);
    }

    #[test]
    fn test_polygon_count_saturates() {
        let call = DrawCall {
            topology: PrimitiveTopology::TriangleList,
            elements: 3_000_000,
            instances: 5000,
        };
        assert_eq!(call.polygon_count(), u32::MAX);
    }

    #[test]
    fn test_signed_counts_reject_overflow() {
        let call = DrawCall {
            topology: PrimitiveTopology::TriangleList,
            elements: 36,
            instances: 4,
        };
        assert_eq!(call.signed_counts(), Some((36, 4)));

        let elements = DrawCall {
            elements: i32::MAX as u32 + 1,
            ..call
        };
        assert_eq!(elements.signed_counts(), None);

        let instances = DrawCall {
            instances: u32::MAX,
            ..call
        };
        assert_eq!(instances.signed_counts(), None);
    }
}
