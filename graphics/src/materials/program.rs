//! Compiled program cache.
//!
//! One program per declared (vertex, fragment) source pair. The cache is pure
//! derived state: it is only ever rebuilt as a whole from the material's
//! current declarations, or released as a whole.

use std::collections::HashMap;

use ember_core::profiling::profile_scope;
use ember_core::uniform::UniformData;

use crate::backend::{GraphicsApi, ProgramHandle, ShaderStage, UniformLocation};
use crate::error::GraphicsError;

use super::material::Declarations;
use super::types::{FragmentVariant, VariantKey, VertexVariant};

/// Programs of one material, keyed by variant pair.
///
/// A `None` entry records a pair whose build failed; it stays failed until
/// the next rebuild.
#[derive(Debug, Default)]
pub(crate) struct ProgramCache {
    programs: HashMap<VariantKey, Option<ProgramHandle>>,
}

impl ProgramCache {
    /// Look up a program. Misses and failed builds both yield `None`.
    pub(crate) fn get(&self, key: VariantKey) -> Option<ProgramHandle> {
        self.programs.get(&key).copied().flatten()
    }

    /// Number of entries, including failed builds.
    pub(crate) fn len(&self) -> usize {
        self.programs.len()
    }

    /// Remove every entry, returning the valid programs.
    pub(crate) fn take_all(&mut self) -> Vec<ProgramHandle> {
        self.programs.drain().filter_map(|(_, p)| p).collect()
    }

    /// Delete every program and empty the cache.
    pub(crate) fn release_all(&mut self, api: &dyn GraphicsApi) {
        for program in self.take_all() {
            api.delete_program(program);
        }
    }

    /// Release everything, then build every declared variant pair.
    pub(crate) fn rebuild(&mut self, api: &dyn GraphicsApi, declarations: &Declarations) {
        profile_scope!("rebuild_programs");
        self.release_all(api);

        for vertex in VertexVariant::ALL {
            let Some(vertex_source) = declarations.sources.get(&vertex.into()) else {
                continue;
            };
            for fragment in FragmentVariant::ALL {
                let Some(fragment_source) = declarations.sources.get(&fragment.into()) else {
                    continue;
                };

                let key = VariantKey::new(vertex, fragment);
                let program = match build_program(api, vertex_source, fragment_source, declarations)
                {
                    Ok(program) => Some(program),
                    Err(err) => {
                        log::error!("Failed to build program {key:?}: {err}");
                        None
                    }
                };
                self.programs.insert(key, program);
            }
        }

        log::debug!(
            "Rebuilt {} programs ({} valid)",
            self.programs.len(),
            self.programs.values().filter(|p| p.is_some()).count()
        );
    }
}

/// Compile, link and initialize one program.
///
/// After linking, explicitly bound samplers are pointed at their texture
/// unit (the slot's position in the material's texture list) and declared
/// uniforms receive their initial values.
fn build_program(
    api: &dyn GraphicsApi,
    vertex_source: &str,
    fragment_source: &str,
    declarations: &Declarations,
) -> Result<ProgramHandle, GraphicsError> {
    let vertex = api.compile_shader(ShaderStage::Vertex, vertex_source)?;
    let fragment = match api.compile_shader(ShaderStage::Fragment, fragment_source) {
        Ok(fragment) => fragment,
        Err(err) => {
            api.delete_shader(vertex);
            return Err(err);
        }
    };

    let program = api.link_program(vertex, fragment);
    api.delete_shader(vertex);
    api.delete_shader(fragment);
    let program = program?;

    api.use_program(program);
    for (unit, texture) in declarations.textures.iter().enumerate() {
        if texture.binding > -1 {
            let unit = [unit as i32];
            api.set_uniform(
                UniformLocation(texture.binding as u32),
                UniformData::Integer(&unit),
            );
        }
    }
    for uniform in &declarations.uniforms {
        if let Some(location) = api.uniform_location(program, &uniform.name) {
            api.set_uniform(location, uniform.value.as_data());
        }
    }

    Ok(program)
}
