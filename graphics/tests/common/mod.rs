//! Common utilities for binding integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across different backend implementations.

use std::sync::Arc;

use ember_core::variant::parse_variant_map;
use ember_graphics::backend::{BufferHandle, DummyBackend, TextureHandle, VertexArrayHandle};
use ember_graphics::mesh::{Lod, Mesh, PrimitiveTopology};
use ember_graphics::{CommandBuffer, Material, Texture, TextureCache, TextureDescriptor};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Available backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Dummy backend (records calls, no GPU).
    Dummy,
}

impl Backend {
    /// Check if this backend is currently available.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy => true,
        }
    }

    /// Get the backend name for display.
    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Dummy => "dummy",
        }
    }
}

// ============================================================================
// Material Documents
// ============================================================================

/// Opaque, single-sided surface with every surface variant declared.
///
/// Properties: `[materialType, doubleSided, surfaces, blendMode, lightModel,
/// depthTest, depthWrite]`.
#[allow(dead_code)]
pub const SURFACE_DOCUMENT: &str = r#"{
    "Properties": List([Int(0), Bool(false), Int(1), Int(0), Int(1), Bool(true), Bool(true)]),
    "Textures": List([
        List([String("textures/albedo.png"), Int(6), String("mainTexture"), Int(0)]),
        List([String("textures/normals.png"), Int(7), String("normalsMap"), Int(0)]),
        List([String("textures/mask.png"), Int(-1), String("maskMap"), Int(0)]),
    ]),
    "Uniforms": List([List([Vector4((1.0, 0.0, 0.0, 1.0)), Int(16), String("tint")])]),
    "Shader": String("uniform vec4 tint; uniform vec4 camera.screen; void main() {}"),
    "Simple": String("uniform vec4 tint; void main() {}"),
    "Static": String("void main() {}"),
    "StaticInst": String("void main() {}"),
    "Skinned": String("uniform mat4 bones[8]; void main() {}"),
}"#;

/// Build a single-sided document with the given blend mode index.
#[allow(dead_code)]
pub fn blended_document(blend_mode: i32) -> String {
    format!(
        r#"{{
            "Properties": List([Int(0), Bool(false), Int(1), Int({blend_mode}), Int(0), Bool(true), Bool(false)]),
            "Shader": String("void main() {{}}"),
            "Simple": String("void main() {{}}"),
            "Static": String("void main() {{}}"),
        }}"#
    )
}

// ============================================================================
// Test Context
// ============================================================================

/// Shared state for one test: a command buffer and a texture loader.
pub struct TestContext {
    pub buffer: CommandBuffer<DummyBackend>,
    pub loader: Arc<TextureCache>,
}

impl TestContext {
    /// Create a context for `backend`, or `None` if it is unavailable.
    pub fn new(backend: Backend) -> Option<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        if !backend.is_available() {
            return None;
        }

        let loader = Arc::new(TextureCache::new());
        for (id, path) in [
            "textures/albedo.png",
            "textures/normals.png",
            "textures/mask.png",
        ]
        .into_iter()
        .enumerate()
        {
            loader.insert(
                path,
                Texture::new(
                    TextureHandle(100 + id as u32),
                    TextureDescriptor::new_2d(4, 4).with_label(path),
                ),
            );
        }

        let buffer = match backend {
            Backend::Dummy => CommandBuffer::new(DummyBackend::new()),
        };
        Some(Self { buffer, loader })
    }

    /// Get the backend.
    pub fn api(&self) -> &DummyBackend {
        self.buffer.api()
    }

    /// Create a material and load `document` into it.
    pub fn material(&self, document: &str) -> Arc<Material> {
        let material = self.buffer.create_material();
        let data = parse_variant_map(document).expect("valid material document");
        material.load_user_data(&data, self.loader.as_ref());
        material
    }

    /// Texture loaded under `path`.
    #[allow(dead_code)]
    pub fn texture(&self, path: &str) -> Arc<Texture> {
        self.loader.get(path).expect("texture is loaded")
    }
}

// ============================================================================
// Meshes
// ============================================================================

/// Indexed mesh of four triangles.
#[allow(dead_code)]
pub fn triangle_mesh() -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList)
        .with_lod(Lod {
            vertex_count: 8,
            index_count: 12,
            vertex_array: VertexArrayHandle(1),
        })
        .with_label("triangles")
}

/// Indexed mesh with a per-instance transform buffer.
#[allow(dead_code)]
pub fn instanced_mesh() -> Mesh {
    triangle_mesh()
        .with_instance_buffer(BufferHandle(9))
        .with_label("instanced")
}
