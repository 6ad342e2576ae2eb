//! Primitive topology.

/// Primitive topology describing how vertices are assembled into primitives.
///
/// List topologies are drawn from an index buffer; strips and fans are drawn
/// straight from the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form a triangle.
    #[default]
    TriangleList,
    /// Every two indices form a line.
    LineList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Vertices form a fan of triangles around the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Returns `true` if meshes with this topology are drawn through their index buffer.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::TriangleList | Self::LineList)
    }

    /// Number of polygons produced by `elements` indices (indexed) or vertices (non-indexed).
    ///
    /// Line topologies are counted the same way as their triangle counterparts
    /// so that polygon statistics stay comparable across passes.
    pub fn polygon_count(&self, elements: u32) -> u32 {
        if self.is_indexed() {
            elements / 3
        } else {
            elements.saturating_sub(2)
        }
    }

    /// Convert from the integer used in serialized mesh data.
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::TriangleList),
            1 => Some(Self::LineList),
            2 => Some(Self::TriangleStrip),
            3 => Some(Self::LineStrip),
            4 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_topologies() {
        assert!(PrimitiveTopology::TriangleList.is_indexed());
        assert!(PrimitiveTopology::LineList.is_indexed());
        assert!(!PrimitiveTopology::TriangleStrip.is_indexed());
        assert!(!PrimitiveTopology::TriangleFan.is_indexed());
    }

    #[test]
    fn test_polygon_count() {
        assert_eq!(PrimitiveTopology::TriangleList.polygon_count(36), 12);
        assert_eq!(PrimitiveTopology::TriangleStrip.polygon_count(4), 2);
        assert_eq!(PrimitiveTopology::TriangleFan.polygon_count(1), 0);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(
            PrimitiveTopology::from_index(4),
            Some(PrimitiveTopology::TriangleFan)
        );
        assert_eq!(PrimitiveTopology::from_index(9), None);
    }
}
