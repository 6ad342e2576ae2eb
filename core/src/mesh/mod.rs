//! CPU-side mesh description shared by loaders and renderers.
//!
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives

mod topology;

pub use topology::PrimitiveTopology;
