//! Render target resource.

use std::sync::Arc;

use crate::backend::FramebufferHandle;

use super::Texture;

/// A set of attachments that draws can be redirected into.
///
/// A render target without a framebuffer stands for the default (window)
/// framebuffer.
#[derive(Debug, Default)]
pub struct RenderTarget {
    framebuffer: Option<FramebufferHandle>,
    color_attachments: Vec<Arc<Texture>>,
    depth_attachment: Option<Arc<Texture>>,
    label: Option<String>,
}

impl RenderTarget {
    /// The default framebuffer.
    pub fn screen() -> Self {
        Self::default()
    }

    /// An offscreen target backed by a framebuffer object.
    pub fn offscreen(framebuffer: FramebufferHandle) -> Self {
        Self {
            framebuffer: Some(framebuffer),
            ..Self::default()
        }
    }

    /// Add a color attachment.
    #[must_use]
    pub fn with_color(mut self, texture: Arc<Texture>) -> Self {
        self.color_attachments.push(texture);
        self
    }

    /// Set the depth attachment.
    #[must_use]
    pub fn with_depth(mut self, texture: Arc<Texture>) -> Self {
        self.depth_attachment = Some(texture);
        self
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Framebuffer handle, `None` for the default framebuffer.
    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    /// Color attachments in attachment order.
    pub fn color_attachments(&self) -> &[Arc<Texture>] {
        &self.color_attachments
    }

    /// Depth attachment.
    pub fn depth_attachment(&self) -> Option<&Arc<Texture>> {
        self.depth_attachment.as_ref()
    }

    /// Get the label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
