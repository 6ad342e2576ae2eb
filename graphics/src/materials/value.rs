//! Declared texture and uniform slots.

use std::sync::{Arc, Weak};

use ember_core::uniform::UniformValue;

use crate::resources::Texture;

/// A named texture slot.
///
/// The texture is referenced weakly: whoever loaded it owns it, and a slot
/// whose texture has been dropped behaves like an empty slot.
#[derive(Debug, Clone)]
pub struct TextureItem {
    /// Sampler name in the shader.
    pub name: String,
    /// The texture, if any.
    pub texture: Weak<Texture>,
    /// Explicit sampler location, or `-1` when the shader binds it itself.
    pub binding: i32,
    /// Loader-defined flags.
    pub flags: u32,
}

impl TextureItem {
    /// Create an unbound slot referencing `texture`.
    pub fn new(name: impl Into<String>, texture: Option<&Arc<Texture>>) -> Self {
        Self {
            name: name.into(),
            texture: texture.map(Arc::downgrade).unwrap_or_default(),
            binding: -1,
            flags: 0,
        }
    }

    /// Set the explicit sampler location.
    #[must_use]
    pub fn with_binding(mut self, binding: i32) -> Self {
        self.binding = binding;
        self
    }

    /// The texture, if it is still alive.
    pub fn texture(&self) -> Option<Arc<Texture>> {
        self.texture.upgrade()
    }
}

/// A named uniform declared by a material.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformItem {
    /// Uniform name in the shader.
    pub name: String,
    /// Current value.
    pub value: UniformValue,
    /// Declared size in the serialized layout.
    pub size: i32,
}

impl UniformItem {
    /// Create a uniform declaration.
    pub fn new(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            size: (value.uniform_type().components() * std::mem::size_of::<f32>()) as i32,
            value,
        }
    }
}
