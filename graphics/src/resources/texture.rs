//! Texture resource.

use crate::backend::{TextureHandle, TextureTarget};

/// Descriptor for a texture already uploaded to the GPU.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Binding target.
    pub target: TextureTarget,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl TextureDescriptor {
    /// Create a 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            target: TextureTarget::Texture2d,
            label: None,
        }
    }

    /// Create a cube map descriptor.
    pub fn new_cube(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            target: TextureTarget::CubeMap,
            label: None,
        }
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A texture usable by materials.
///
/// Textures are owned by the resource cache and shared as `Arc<Texture>`.
/// Materials, instances and command buffers only keep `Weak` references, so a
/// texture evicted from the cache simply stops being bound.
///
/// # Example
///
/// ```
/// use ember_graphics::backend::TextureHandle;
/// use ember_graphics::resources::{Texture, TextureDescriptor};
///
/// let texture = Texture::new(TextureHandle(7), TextureDescriptor::new_2d(256, 256));
/// assert!(!texture.is_cubemap());
/// ```
#[derive(Debug)]
pub struct Texture {
    handle: TextureHandle,
    descriptor: TextureDescriptor,
}

impl Texture {
    /// Wrap an uploaded texture.
    pub fn new(handle: TextureHandle, descriptor: TextureDescriptor) -> Self {
        Self { handle, descriptor }
    }

    /// Get the backend handle.
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the binding target.
    pub fn target(&self) -> TextureTarget {
        self.descriptor.target
    }

    /// Returns `true` for cube maps.
    pub fn is_cubemap(&self) -> bool {
        self.descriptor.target == TextureTarget::CubeMap
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_accessors() {
        let texture = Texture::new(
            TextureHandle(1),
            TextureDescriptor::new_cube(64).with_label("sky"),
        );
        assert!(texture.is_cubemap());
        assert_eq!(texture.width(), 64);
        assert_eq!(texture.height(), 64);
        assert_eq!(texture.label(), Some("sky"));
        assert_eq!(texture.handle(), TextureHandle(1));
    }
}
