//! Material system.
//!
//! This module provides a two-level material abstraction:
//!
//! - [`Material`] - Declares shader sources, render properties, texture slots
//!   and uniform defaults, and owns the compiled programs built from them
//! - [`MaterialInstance`] - References a shared material and carries sparse,
//!   live per-instance overrides
//!
//! Materials are shared as `Arc<Material>` across threads. Loader threads
//! replace declarations with [`Material::load_user_data`]; the render thread
//! lazily rebuilds programs the next time an instance of the material is
//! bound. The [`MaterialState`] machine coordinates the two.

mod binding;
mod instance;
mod material;
mod program;
mod state;
mod types;
mod value;

pub(crate) use binding::{bind_instance, FrameBindings};
pub use binding::{is_layer_allowed, resolve_pipeline_state, resolve_texture};
pub use instance::{MaterialInstance, ParamInfo, ParamKind};
pub use material::{Material, MaterialProperties, PROPERTIES, SKIN_MATRICES, TEXTURES, UNIFORMS};
pub use state::{AtomicMaterialState, MaterialState};
pub use types::{
    BlendMode, FragmentVariant, LightModel, MaterialType, RenderLayer, ShaderVariant, SurfaceType,
    VariantKey, VertexVariant,
};
pub use value::{TextureItem, UniformItem};
