//! # Ember Graphics
//!
//! Material resolution and draw binding for the Ember engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Material`] - Shared shader/render-state declarations with lazily built programs
//! - [`MaterialInstance`] - Per-use-site overrides over a shared material
//! - [`CommandBuffer`] - Per-frame draw recording that binds instances
//! - [`GraphicsApi`] - Trait for graphics backend implementations
//! - Backends: Dummy (for testing) and OpenGL (`gl-backend` feature)
//!
//! ## Example
//!
//! ```
//! use ember_graphics::backend::DummyBackend;
//! use ember_graphics::materials::{FragmentVariant, SurfaceType, VertexVariant};
//! use ember_graphics::CommandBuffer;
//!
//! let mut buffer = CommandBuffer::new(DummyBackend::new());
//! let material = buffer.create_material();
//! material.set_shader_source(VertexVariant::Static.into(), "void main() {}");
//! material.set_shader_source(FragmentVariant::Default.into(), "void main() {}");
//!
//! let instance = material.create_instance(SurfaceType::Static);
//! buffer.begin_frame();
//! // draw_mesh(...) with `instance`
//! buffer.finish();
//! ```

pub mod backend;
pub mod command_buffer;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod pipeline;
pub mod resources;
pub mod settings;

// Re-export main types for convenience
pub use backend::{DeferredReleases, DummyBackend, GraphicsApi};
pub use command_buffer::{CommandBuffer, FrameStats};
pub use error::GraphicsError;
pub use materials::{Material, MaterialInstance, MaterialState, RenderLayer, SurfaceType};
pub use mesh::{Lod, Mesh};
pub use pipeline::PipelineState;
pub use resources::{RenderTarget, ResourceLoader, Texture, TextureCache, TextureDescriptor};
pub use settings::RenderSettings;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Ember Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy");
    }
}
