//! Draw-time resolution of a material instance.
//!
//! Binding an instance for a draw runs these steps, stopping silently at the
//! first that fails:
//!
//! 1. Layer gating on the blend mode.
//! 2. Fragment variant selection from the layer.
//! 3. Program lookup (building programs if the material is out of date).
//! 4. Pipeline state.
//! 5. Uniforms, lowest precedence first: reserved per-draw slots, frame
//!    globals, material declarations, instance overrides.
//! 6. Textures: one unit per material slot, in declaration order.

use std::collections::BTreeMap;
use std::sync::Arc;

use ember_core::uniform::{UniformData, UniformValue};

use crate::backend::{GraphicsApi, ProgramHandle};
use crate::command_buffer::{FragmentBufferObject, VertexBufferObject};
use crate::pipeline::{BlendState, CullFace, DepthState, PipelineState};
use crate::resources::Texture;
use crate::settings::ReservedSlots;

use super::instance::{InstanceParam, MaterialInstance};
use super::material::MaterialProperties;
use super::types::{BlendMode, FragmentVariant, MaterialType, RenderLayer, VariantKey};
use super::value::TextureItem;

/// Returns `false` if a material with `blend_mode` must not draw in `layer`.
///
/// Blended materials stay out of the opaque and shadow passes; opaque
/// materials stay out of the translucent pass.
pub fn is_layer_allowed(blend_mode: BlendMode, layer: RenderLayer) -> bool {
    let blended = matches!(blend_mode, BlendMode::Additive | BlendMode::Translucent);
    if blended && layer.intersects(RenderLayer::DEFAULT | RenderLayer::SHADOWCAST) {
        return false;
    }
    !(blend_mode == BlendMode::Opaque && layer.contains(RenderLayer::TRANSLUCENT))
}

/// Depth, culling and blending for a material drawn in `layer`.
pub fn resolve_pipeline_state(properties: &MaterialProperties, layer: RenderLayer) -> PipelineState {
    let raycast = layer.contains(RenderLayer::RAYCAST);

    let depth = if properties.depth_test {
        DepthState::Enabled {
            write: properties.depth_write,
        }
    } else {
        DepthState::Disabled
    };

    let cull = if properties.double_sided || raycast {
        None
    } else if properties.material_type == MaterialType::LightFunction {
        Some(CullFace::Front)
    } else {
        Some(CullFace::Back)
    };

    let blend = match properties.blend_mode {
        _ if raycast => None,
        BlendMode::Opaque => None,
        BlendMode::Translucent => Some(BlendState::premultiplied_alpha()),
        BlendMode::Additive => Some(BlendState::additive()),
    };

    PipelineState { depth, cull, blend }
}

/// The texture bound for a material slot: the instance override, else the
/// frame-global override, else the material's own texture.
///
/// Overrides whose texture has been dropped are skipped.
pub fn resolve_texture(
    item: &TextureItem,
    instance: &MaterialInstance,
    global_textures: &[TextureItem],
) -> Option<Arc<Texture>> {
    instance
        .texture(&item.name)
        .or_else(|| {
            global_textures
                .iter()
                .find(|global| global.name == item.name)
                .and_then(TextureItem::texture)
        })
        .or_else(|| item.texture())
}

/// Per-frame state a bind reads.
pub(crate) struct FrameBindings<'a> {
    pub(crate) vertex: &'a VertexBufferObject,
    pub(crate) fragment: &'a FragmentBufferObject,
    pub(crate) slots: &'a ReservedSlots,
    pub(crate) globals: &'a BTreeMap<String, UniformValue>,
    pub(crate) global_textures: &'a [TextureItem],
}

/// Resolve and apply everything `instance` needs to draw in `layer`.
///
/// Returns the bound program, or `None` if this draw must be skipped.
pub(crate) fn bind_instance(
    api: &dyn GraphicsApi,
    instance: &MaterialInstance,
    frame: &FrameBindings<'_>,
    layer: RenderLayer,
) -> Option<ProgramHandle> {
    let material = instance.material();
    let properties = material.properties();
    if !is_layer_allowed(properties.blend_mode, layer) {
        log::trace!("Skipping {:?} material in layer {:?}", properties.blend_mode, layer);
        return None;
    }

    let key = VariantKey::new(instance.vertex_variant(), FragmentVariant::for_layer(layer));
    let Some(program) = material.get_program(api, key) else {
        log::trace!("No program for {key:?} in material {:?}", material.label());
        return None;
    };

    api.apply_pipeline_state(&resolve_pipeline_state(&properties, layer));
    api.use_program(program);

    let slots = frame.slots;
    let vertex = frame.vertex;
    let fragment = frame.fragment;
    api.set_uniform(slots.model, UniformData::Matrix4(std::slice::from_ref(&vertex.model)));
    api.set_uniform(slots.view, UniformData::Matrix4(std::slice::from_ref(&vertex.view)));
    api.set_uniform(
        slots.projection,
        UniformData::Matrix4(std::slice::from_ref(&vertex.projection)),
    );
    api.set_uniform(slots.color, UniformData::Vector4(std::slice::from_ref(&fragment.color)));
    api.set_uniform(slots.clip, UniformData::Float(std::slice::from_ref(&fragment.clip)));
    api.set_uniform(slots.time, UniformData::Float(std::slice::from_ref(&fragment.time)));

    for (name, value) in frame.globals {
        if let Some(location) = api.uniform_location(program, name) {
            api.set_uniform(location, value.as_data());
        }
    }

    let declarations = material.declarations();
    for uniform in &declarations.uniforms {
        if let Some(location) = api.uniform_location(program, &uniform.name) {
            api.set_uniform(location, uniform.value.as_data());
        }
    }

    for (name, param) in instance.raw_params() {
        // Declared entries were uploaded with the material's values above.
        let InstanceParam::Uniform { source, count } = param else {
            continue;
        };
        if let Some(location) = api.uniform_location(program, name) {
            source.with_data(&mut |data| {
                let data = data.truncated(*count);
                if !data.is_empty() {
                    api.set_uniform(location, data);
                }
            });
        }
    }

    for (unit, item) in declarations.textures.iter().enumerate() {
        if let Some(texture) = resolve_texture(item, instance, frame.global_textures) {
            api.bind_texture(unit as u32, &texture);
        }
    }

    Some(program)
}
