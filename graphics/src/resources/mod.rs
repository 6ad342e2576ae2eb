//! Resources referenced by materials and draws.
//!
//! - [`Texture`] - An uploaded texture, shared as `Arc<Texture>`
//! - [`RenderTarget`] - Attachments draws can be redirected into
//! - [`ResourceLoader`] - How materials resolve texture paths
//! - [`TextureCache`] - In-memory [`ResourceLoader`] owning its textures

mod render_target;
mod texture;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub use render_target::RenderTarget;
pub use texture::{Texture, TextureDescriptor};

/// Resolves resource paths found in serialized material data.
pub trait ResourceLoader: Send + Sync {
    /// Load (or fetch an already loaded) texture. `None` if it cannot be provided.
    fn load_texture(&self, path: &str) -> Option<Arc<Texture>>;
}

/// Thread-safe map from path to texture.
///
/// The cache holds the only strong references; everything else observes
/// textures through `Weak`, so [`TextureCache::evict`] makes a texture
/// disappear from every material that referenced it.
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: RwLock<HashMap<String, Arc<Texture>>>,
}

impl TextureCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a texture. Returns the shared handle.
    pub fn insert(&self, path: impl Into<String>, texture: Texture) -> Arc<Texture> {
        let texture = Arc::new(texture);
        self.textures.write().insert(path.into(), Arc::clone(&texture));
        texture
    }

    /// Look up a texture.
    pub fn get(&self, path: &str) -> Option<Arc<Texture>> {
        self.textures.read().get(path).cloned()
    }

    /// Remove a texture. Returns the removed handle.
    pub fn evict(&self, path: &str) -> Option<Arc<Texture>> {
        self.textures.write().remove(path)
    }

    /// Number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.read().len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.read().is_empty()
    }
}

impl ResourceLoader for TextureCache {
    fn load_texture(&self, path: &str) -> Option<Arc<Texture>> {
        let texture = self.get(path);
        if texture.is_none() {
            log::warn!("Texture '{}' is not loaded", path);
        }
        texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureHandle;

    #[test]
    fn test_cache_owns_textures() {
        let cache = TextureCache::new();
        let weak = Arc::downgrade(&cache.insert(
            "textures/albedo.png",
            Texture::new(TextureHandle(1), TextureDescriptor::new_2d(4, 4)),
        ));

        assert!(weak.upgrade().is_some());
        assert!(cache.load_texture("textures/albedo.png").is_some());
        assert!(cache.load_texture("textures/missing.png").is_none());

        cache.evict("textures/albedo.png");
        assert!(weak.upgrade().is_none());
        assert!(cache.is_empty());
    }
}
