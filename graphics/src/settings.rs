//! Render configuration.

use ember_core::math::Vec4;

use crate::backend::UniformLocation;

/// Clip threshold uploaded to every program.
pub const DEFAULT_CLIP: f32 = 0.99;

/// Fixed uniform locations every program reserves for per-draw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservedSlots {
    /// Model matrix.
    pub model: UniformLocation,
    /// View matrix.
    pub view: UniformLocation,
    /// Projection matrix.
    pub projection: UniformLocation,
    /// Draw color.
    pub color: UniformLocation,
    /// Clip threshold.
    pub clip: UniformLocation,
    /// Time in seconds.
    pub time: UniformLocation,
}

impl Default for ReservedSlots {
    fn default() -> Self {
        Self {
            model: UniformLocation(0),
            view: UniformLocation(1),
            projection: UniformLocation(2),
            color: UniformLocation(3),
            clip: UniformLocation(4),
            time: UniformLocation(5),
        }
    }
}

/// Configuration for a [`CommandBuffer`](crate::CommandBuffer).
///
/// # Example
///
/// ```
/// use ember_core::math::Vec4;
/// use ember_graphics::RenderSettings;
///
/// let settings = RenderSettings::new()
///     .with_clip(0.5)
///     .with_initial_color(Vec4::new(1.0, 0.0, 0.0, 1.0));
/// assert_eq!(settings.clip, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Clip threshold.
    pub clip: f32,
    /// Draw color at creation.
    pub initial_color: Vec4,
    /// Reserved uniform locations.
    pub slots: ReservedSlots,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clip: DEFAULT_CLIP,
            initial_color: Vec4::repeat(1.0),
            slots: ReservedSlots::default(),
        }
    }
}

impl RenderSettings {
    /// Create the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clip threshold.
    #[must_use]
    pub fn with_clip(mut self, clip: f32) -> Self {
        self.clip = clip;
        self
    }

    /// Set the initial draw color.
    #[must_use]
    pub fn with_initial_color(mut self, color: Vec4) -> Self {
        self.initial_color = color;
        self
    }

    /// Set the reserved uniform locations.
    #[must_use]
    pub fn with_slots(mut self, slots: ReservedSlots) -> Self {
        self.slots = slots;
        self
    }
}
