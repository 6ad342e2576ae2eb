//! Material enums, shader variants and render layers.

use bitflags::bitflags;

use crate::backend::ShaderStage;

/// What a material is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    /// Geometry surfaces.
    #[default]
    Surface,
    /// Full-screen post-processing.
    PostProcess,
    /// Light volumes; rendered with front faces culled.
    LightFunction,
}

/// How a material's output is combined with the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// No blending.
    #[default]
    Opaque,
    /// `src + dst`.
    Additive,
    /// Premultiplied alpha over.
    Translucent,
}

/// Shading model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightModel {
    /// No lighting.
    #[default]
    Unlit,
    /// Standard lighting.
    Lit,
    /// Subsurface scattering.
    Subsurface,
}

macro_rules! impl_from_index {
    ($ty:ident { $($index:literal => $variant:ident),* $(,)? }) => {
        impl $ty {
            /// Convert from the integer used in serialized material data.
            pub fn from_index(index: i32) -> Option<Self> {
                match index {
                    $($index => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

impl_from_index!(MaterialType { 0 => Surface, 1 => PostProcess, 2 => LightFunction });
impl_from_index!(BlendMode { 0 => Opaque, 1 => Additive, 2 => Translucent });
impl_from_index!(LightModel { 0 => Unlit, 1 => Lit, 2 => Subsurface });

/// Geometry kind an instance is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceType {
    /// Regular static meshes.
    #[default]
    Static,
    /// Meshes deformed by a skinning palette.
    Skinned,
    /// Camera-facing particles.
    Billboard,
    /// Hardware-instanced static meshes.
    Instanced,
}

impl SurfaceType {
    /// The vertex shader variant used to draw this kind of geometry.
    pub fn vertex_variant(&self) -> VertexVariant {
        match self {
            Self::Static => VertexVariant::Static,
            Self::Skinned => VertexVariant::Skinned,
            Self::Billboard => VertexVariant::Particle,
            Self::Instanced => VertexVariant::Instanced,
        }
    }
}

/// Vertex shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexVariant {
    /// Plain transform by the model matrix.
    Static,
    /// Per-instance transforms from the instance buffer.
    Instanced,
    /// Skinned by the `skinMatrices` palette.
    Skinned,
    /// Billboarded particles.
    Particle,
}

impl VertexVariant {
    /// Every vertex variant, in build order.
    pub const ALL: [Self; 4] = [Self::Static, Self::Instanced, Self::Skinned, Self::Particle];

    /// Key under which the source is stored in serialized material data.
    pub fn source_key(&self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Instanced => "StaticInst",
            Self::Skinned => "Skinned",
            Self::Particle => "Particle",
        }
    }
}

/// Fragment shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentVariant {
    /// Full shading.
    Default,
    /// Reduced shading for shadow and picking passes.
    Simple,
}

impl FragmentVariant {
    /// Every fragment variant, in build order.
    pub const ALL: [Self; 2] = [Self::Default, Self::Simple];

    /// Key under which the source is stored in serialized material data.
    pub fn source_key(&self) -> &'static str {
        match self {
            Self::Default => "Shader",
            Self::Simple => "Simple",
        }
    }

    /// The fragment variant a draw in `layer` uses.
    pub fn for_layer(layer: RenderLayer) -> Self {
        if layer.intersects(RenderLayer::RAYCAST | RenderLayer::SHADOWCAST) {
            Self::Simple
        } else {
            Self::Default
        }
    }
}

/// Any shader variant; the key of a material's shader sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderVariant {
    /// A vertex stage.
    Vertex(VertexVariant),
    /// A fragment stage.
    Fragment(FragmentVariant),
}

impl ShaderVariant {
    /// Pipeline stage this variant compiles to.
    pub fn stage(&self) -> ShaderStage {
        match self {
            Self::Vertex(_) => ShaderStage::Vertex,
            Self::Fragment(_) => ShaderStage::Fragment,
        }
    }

    /// Key under which the source is stored in serialized material data.
    pub fn source_key(&self) -> &'static str {
        match self {
            Self::Vertex(variant) => variant.source_key(),
            Self::Fragment(variant) => variant.source_key(),
        }
    }
}

impl From<VertexVariant> for ShaderVariant {
    fn from(variant: VertexVariant) -> Self {
        Self::Vertex(variant)
    }
}

impl From<FragmentVariant> for ShaderVariant {
    fn from(variant: FragmentVariant) -> Self {
        Self::Fragment(variant)
    }
}

/// Program cache key: one linked program per (vertex, fragment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    /// Vertex stage.
    pub vertex: VertexVariant,
    /// Fragment stage.
    pub fragment: FragmentVariant,
}

impl VariantKey {
    /// Create a key.
    pub fn new(vertex: VertexVariant, fragment: FragmentVariant) -> Self {
        Self { vertex, fragment }
    }
}

bitflags! {
    /// Render pass categories a draw is submitted for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderLayer: u32 {
        /// Opaque geometry pass.
        const DEFAULT = 1 << 0;
        /// Blended geometry pass.
        const TRANSLUCENT = 1 << 1;
        /// Shadow map pass.
        const SHADOWCAST = 1 << 2;
        /// Picking pass.
        const RAYCAST = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_vertex_variants() {
        assert_eq!(SurfaceType::Static.vertex_variant(), VertexVariant::Static);
        assert_eq!(SurfaceType::Skinned.vertex_variant(), VertexVariant::Skinned);
        assert_eq!(SurfaceType::Billboard.vertex_variant(), VertexVariant::Particle);
        assert_eq!(SurfaceType::Instanced.vertex_variant(), VertexVariant::Instanced);
    }

    #[test]
    fn test_fragment_variant_for_layer() {
        assert_eq!(
            FragmentVariant::for_layer(RenderLayer::DEFAULT),
            FragmentVariant::Default
        );
        assert_eq!(
            FragmentVariant::for_layer(RenderLayer::TRANSLUCENT),
            FragmentVariant::Default
        );
        assert_eq!(
            FragmentVariant::for_layer(RenderLayer::SHADOWCAST),
            FragmentVariant::Simple
        );
        assert_eq!(
            FragmentVariant::for_layer(RenderLayer::DEFAULT | RenderLayer::RAYCAST),
            FragmentVariant::Simple
        );
    }

    #[test]
    fn test_variant_keys_do_not_collide() {
        let mut keys = Vec::new();
        for vertex in VertexVariant::ALL {
            for fragment in FragmentVariant::ALL {
                keys.push(VariantKey::new(vertex, fragment));
            }
        }
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), VertexVariant::ALL.len() * FragmentVariant::ALL.len());
    }

    #[test]
    fn test_from_index() {
        assert_eq!(BlendMode::from_index(2), Some(BlendMode::Translucent));
        assert_eq!(MaterialType::from_index(2), Some(MaterialType::LightFunction));
        assert_eq!(LightModel::from_index(7), None);
    }
}
