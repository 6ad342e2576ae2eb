//! Fixed-function pipeline state.
//!
//! A [`PipelineState`] is the complete description of depth, culling and
//! blending applied before a draw. It is computed from material properties and
//! the render layer (see [`crate::materials::resolve_pipeline_state`]) and
//! handed to the backend in one call, so backends never have to reason about
//! materials.

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthState {
    /// Depth testing off. Depth writes are irrelevant while testing is off.
    Disabled,
    /// Depth testing on.
    Enabled {
        /// Whether passing fragments write depth.
        write: bool,
    },
}

impl Default for DepthState {
    fn default() -> Self {
        Self::Enabled { write: true }
    }
}

impl DepthState {
    /// Returns `true` if depth testing is enabled.
    pub fn test_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// Returns `true` if depth writes are enabled.
    pub fn write_enabled(&self) -> bool {
        matches!(self, Self::Enabled { write: true })
    }
}

/// Which polygon face is culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

/// Blend operation for combining colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
}

/// Blend state for color blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Source factor.
    pub src_factor: BlendFactor,
    /// Destination factor.
    pub dst_factor: BlendFactor,
    /// Blend equation.
    pub operation: BlendOperation,
}

impl BlendState {
    /// Premultiplied alpha blending (`ONE, ONE_MINUS_SRC_ALPHA`).
    pub fn premultiplied_alpha() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    /// Straight alpha blending (`SRC_ALPHA, ONE_MINUS_SRC_ALPHA`).
    pub fn alpha_blending() -> Self {
        Self {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    /// Additive blending (`ONE, ONE`).
    pub fn additive() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        }
    }
}

/// Depth, culling and blending applied before a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Depth test and write.
    pub depth: DepthState,
    /// Face culling; `None` disables culling.
    pub cull: Option<CullFace>,
    /// Color blending; `None` disables blending.
    pub blend: Option<BlendState>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// Create the default state: depth test and write on, back faces culled,
    /// blending off.
    pub fn new() -> Self {
        Self {
            depth: DepthState::default(),
            cull: Some(CullFace::Back),
            blend: None,
        }
    }

    /// Set the depth state.
    #[must_use]
    pub fn with_depth(mut self, depth: DepthState) -> Self {
        self.depth = depth;
        self
    }

    /// Set the culled face, or `None` to disable culling.
    #[must_use]
    pub fn with_cull(mut self, cull: Option<CullFace>) -> Self {
        self.cull = cull;
        self
    }

    /// Set the blend state, or `None` to disable blending.
    #[must_use]
    pub fn with_blend(mut self, blend: Option<BlendState>) -> Self {
        self.blend = blend;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_flags() {
        assert!(!DepthState::Disabled.write_enabled());
        assert!(DepthState::Enabled { write: false }.test_enabled());
        assert!(!DepthState::Enabled { write: false }.write_enabled());
    }

    #[test]
    fn test_builder() {
        let state = PipelineState::new()
            .with_cull(None)
            .with_blend(Some(BlendState::additive()));
        assert_eq!(state.cull, None);
        assert_eq!(state.blend.map(|b| b.dst_factor), Some(BlendFactor::One));
        assert!(state.depth.write_enabled());
    }
}
