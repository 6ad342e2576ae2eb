//! # Ember Core
//!
//! Engine-agnostic building blocks shared by the Ember crates:
//!
//! - [`math`] - `nalgebra` aliases used by every renderer-facing API
//! - [`variant`] - Loosely-typed serialized data ([`variant::VariantMap`])
//! - [`uniform`] - Typed uniform values and caller-owned live uniform storage
//! - [`mesh`] - Primitive topology shared by loaders and renderers
//! - [`compute`] - Worker thread pool for non-render work
//! - [`profiling`] - Optional Tracy instrumentation

pub mod compute;
pub mod math;
pub mod mesh;
pub mod profiling;
pub mod uniform;
pub mod variant;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Ember Core v{} initialized", VERSION);
}
