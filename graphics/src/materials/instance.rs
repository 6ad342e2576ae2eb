//! Material instance with per-use-site overrides.
//!
//! A [`MaterialInstance`] references a shared [`Material`] and layers sparse
//! overrides on top of it. Overrides are live: uniform overrides hold a
//! [`SharedUniform`] that the caller keeps mutating (an animated tint, a
//! skinning palette) and texture overrides hold a weak texture reference. The
//! current contents are read when the instance is bound, not when the
//! override is set.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use ember_core::math::{Mat4, Vec2, Vec3, Vec4};
use ember_core::uniform::{SharedUniform, UniformElement, UniformSource, UniformType};

use crate::resources::Texture;

use super::material::Material;
use super::types::VertexVariant;

/// What an instance parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// A uniform of the given type.
    Uniform(UniformType),
    /// A texture.
    Texture,
}

/// Type and element count of an instance parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    /// Parameter kind.
    pub kind: ParamKind,
    /// Number of elements uploaded.
    pub count: usize,
}

/// One entry of an instance's parameter table.
#[derive(Clone)]
pub(crate) enum InstanceParam {
    /// Mirrors the material's declared value.
    Declared(UniformType),
    /// Caller-owned storage read at bind time.
    Uniform {
        source: Arc<dyn UniformSource>,
        count: usize,
    },
    /// Texture override.
    Texture { texture: Weak<Texture>, count: usize },
}

impl InstanceParam {
    fn info(&self) -> ParamInfo {
        match self {
            Self::Declared(ty) => ParamInfo {
                kind: ParamKind::Uniform(*ty),
                count: 1,
            },
            Self::Uniform { source, count } => ParamInfo {
                kind: ParamKind::Uniform(source.uniform_type()),
                count: *count,
            },
            Self::Texture { count, .. } => ParamInfo {
                kind: ParamKind::Texture,
                count: *count,
            },
        }
    }
}

impl std::fmt::Debug for InstanceParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InstanceParam").field(&self.info()).finish()
    }
}

/// A material instance with per-instance overrides.
///
/// Instances are created by [`Material::create_instance`], which fixes the
/// vertex variant from the surface type and seeds one entry per declared
/// uniform. Overrides only ever add or replace entries.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ember_core::math::Vec4;
/// use ember_core::uniform::SharedUniform;
/// use ember_graphics::backend::DeferredReleases;
/// use ember_graphics::materials::{Material, SurfaceType};
///
/// let material = Arc::new(Material::new(DeferredReleases::new()));
/// material.set_uniform("tint", Vec4::new(1.0, 0.0, 0.0, 1.0));
///
/// let tint = SharedUniform::from_value(Vec4::new(0.0, 1.0, 0.0, 1.0));
/// let mut instance = material.create_instance(SurfaceType::Static);
/// instance.set_vector4("tint", &tint, 1);
///
/// // Later writes are seen at the next bind.
/// tint.set(0, Vec4::new(0.0, 0.0, 1.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct MaterialInstance {
    material: Arc<Material>,
    vertex_variant: VertexVariant,
    params: HashMap<String, InstanceParam>,
    label: Option<String>,
}

impl MaterialInstance {
    pub(crate) fn new(material: Arc<Material>, vertex_variant: VertexVariant) -> Self {
        Self {
            material,
            vertex_variant,
            params: HashMap::new(),
            label: None,
        }
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the instance label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the parent material.
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Vertex shader variant used for every draw of this instance.
    pub fn vertex_variant(&self) -> VertexVariant {
        self.vertex_variant
    }

    /// Change the vertex shader variant.
    pub fn set_vertex_variant(&mut self, variant: VertexVariant) {
        self.vertex_variant = variant;
    }

    pub(crate) fn declare(&mut self, name: &str, ty: UniformType) {
        self.params
            .insert(name.to_string(), InstanceParam::Declared(ty));
    }

    /// Override a uniform with caller-owned storage; `count` elements are uploaded.
    pub fn set_uniform<T: UniformElement>(
        &mut self,
        name: &str,
        values: &SharedUniform<T>,
        count: usize,
    ) {
        self.params.insert(
            name.to_string(),
            InstanceParam::Uniform {
                source: Arc::new(values.clone()),
                count,
            },
        );
    }

    /// Override an `int` uniform.
    pub fn set_integer(&mut self, name: &str, values: &SharedUniform<i32>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a `float` uniform.
    pub fn set_float(&mut self, name: &str, values: &SharedUniform<f32>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a `vec2` uniform.
    pub fn set_vector2(&mut self, name: &str, values: &SharedUniform<Vec2>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a `vec3` uniform.
    pub fn set_vector3(&mut self, name: &str, values: &SharedUniform<Vec3>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a `vec4` uniform.
    pub fn set_vector4(&mut self, name: &str, values: &SharedUniform<Vec4>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a `mat4` uniform.
    pub fn set_matrix4(&mut self, name: &str, values: &SharedUniform<Mat4>, count: usize) {
        self.set_uniform(name, values, count);
    }

    /// Override a texture slot. The texture is referenced weakly.
    pub fn set_texture(&mut self, name: &str, texture: &Arc<Texture>, count: usize) {
        self.params.insert(
            name.to_string(),
            InstanceParam::Texture {
                texture: Arc::downgrade(texture),
                count,
            },
        );
    }

    /// The texture override for `name`.
    ///
    /// `None` when there is no texture override (the material's texture is
    /// not consulted) or the overriding texture has been dropped.
    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        match self.params.get(name)? {
            InstanceParam::Texture { texture, .. } => texture.upgrade(),
            _ => None,
        }
    }

    /// Type and count of a parameter.
    pub fn param(&self, name: &str) -> Option<ParamInfo> {
        self.params.get(name).map(InstanceParam::info)
    }

    /// All parameters, in no particular order.
    pub fn params(&self) -> impl Iterator<Item = (&str, ParamInfo)> + '_ {
        self.params
            .iter()
            .map(|(name, param)| (name.as_str(), param.info()))
    }

    pub(crate) fn raw_params(&self) -> impl Iterator<Item = (&str, &InstanceParam)> + '_ {
        self.params.iter().map(|(name, param)| (name.as_str(), param))
    }
}

static_assertions::assert_impl_all!(MaterialInstance: Send, Sync);
