//! Material definition.
//!
//! A [`Material`] is the shared description of how a surface is drawn: its
//! fixed-function properties, declared textures and uniforms, and the raw
//! shader source of every variant it supports. Materials are shared as
//! `Arc<Material>` by all of their [`MaterialInstance`]s.
//!
//! Programs are compiled lazily on the render thread. Any change to the
//! sources marks the material [`MaterialState::ToBeUpdated`]; the next
//! [`Material::get_program`] call tears the cache down and rebuilds every
//! declared variant pair.

use std::collections::BTreeMap;
use std::sync::Arc;

use ember_core::uniform::UniformValue;
use ember_core::variant::{Variant, VariantMap};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::backend::{DeferredReleases, GraphicsApi, ProgramHandle};
use crate::resources::{ResourceLoader, Texture};

use super::instance::MaterialInstance;
use super::program::ProgramCache;
use super::state::{AtomicMaterialState, MaterialState};
use super::types::{
    BlendMode, FragmentVariant, LightModel, MaterialType, ShaderVariant, SurfaceType, VariantKey,
    VertexVariant,
};
use super::value::{TextureItem, UniformItem};

/// Serialized section holding the fixed-function properties.
pub const PROPERTIES: &str = "Properties";
/// Serialized section holding texture declarations.
pub const TEXTURES: &str = "Textures";
/// Serialized section holding uniform declarations.
pub const UNIFORMS: &str = "Uniforms";

/// Sampler slot declared by materials with a skinned vertex variant.
pub const SKIN_MATRICES: &str = "skinMatrices";

/// Fixed-function properties of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialProperties {
    /// What the material is used for.
    pub material_type: MaterialType,
    /// Framebuffer blending.
    pub blend_mode: BlendMode,
    /// Shading model.
    pub light_model: LightModel,
    /// Disables face culling.
    pub double_sided: bool,
    /// Enables the depth test.
    pub depth_test: bool,
    /// Enables depth writes (only meaningful with the depth test on).
    pub depth_write: bool,
    /// Number of surfaces the material is authored for.
    pub surfaces: i32,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            material_type: MaterialType::Surface,
            blend_mode: BlendMode::Opaque,
            light_model: LightModel::Unlit,
            double_sided: true,
            depth_test: true,
            depth_write: true,
            surfaces: 1,
        }
    }
}

impl MaterialProperties {
    /// Read the positional `Properties` list:
    /// `[materialType, doubleSided, surfaces, blendMode, lightModel, depthTest, depthWrite]`.
    ///
    /// Missing or out-of-range positions keep their defaults.
    fn from_list(list: &[Variant]) -> Self {
        let defaults = Self::default();
        let at = |index: usize| list.get(index).filter(|v| v.is_valid());
        Self {
            material_type: at(0)
                .and_then(|v| MaterialType::from_index(v.to_int()))
                .unwrap_or(defaults.material_type),
            double_sided: at(1).map_or(defaults.double_sided, Variant::to_bool),
            surfaces: at(2).map_or(defaults.surfaces, Variant::to_int),
            blend_mode: at(3)
                .and_then(|v| BlendMode::from_index(v.to_int()))
                .unwrap_or(defaults.blend_mode),
            light_model: at(4)
                .and_then(|v| LightModel::from_index(v.to_int()))
                .unwrap_or(defaults.light_model),
            depth_test: at(5).map_or(defaults.depth_test, Variant::to_bool),
            depth_write: at(6).map_or(defaults.depth_write, Variant::to_bool),
        }
    }
}

/// Everything a material declares. Swapped as a unit on reload.
#[derive(Debug, Clone, Default)]
pub(crate) struct Declarations {
    pub(crate) properties: MaterialProperties,
    pub(crate) textures: Vec<TextureItem>,
    pub(crate) uniforms: Vec<UniformItem>,
    pub(crate) sources: BTreeMap<ShaderVariant, String>,
}

impl Declarations {
    fn set_texture(&mut self, name: &str, texture: Option<&Arc<Texture>>) {
        match self.textures.iter_mut().find(|item| item.name == name) {
            Some(item) => item.texture = texture.map(Arc::downgrade).unwrap_or_default(),
            None => self.textures.push(TextureItem::new(name, texture)),
        }
    }

    fn parse(data: &VariantMap, loader: &dyn ResourceLoader) -> Self {
        let mut declarations = Self {
            properties: match data.get(PROPERTIES) {
                Some(Variant::List(list)) => MaterialProperties::from_list(list),
                Some(_) => {
                    log::warn!("Material '{PROPERTIES}' section is not a list");
                    MaterialProperties::default()
                }
                None => MaterialProperties::default(),
            },
            textures: data
                .get(TEXTURES)
                .map(|section| parse_textures(section, loader))
                .unwrap_or_default(),
            uniforms: data.get(UNIFORMS).map(parse_uniforms).unwrap_or_default(),
            sources: BTreeMap::new(),
        };

        let mut variants = vec![
            ShaderVariant::Fragment(FragmentVariant::Default),
            ShaderVariant::Vertex(VertexVariant::Static),
        ];
        if declarations.properties.material_type == MaterialType::Surface {
            variants.extend([
                ShaderVariant::Fragment(FragmentVariant::Simple),
                ShaderVariant::Vertex(VertexVariant::Instanced),
                ShaderVariant::Vertex(VertexVariant::Particle),
                ShaderVariant::Vertex(VertexVariant::Skinned),
            ]);
        }
        for variant in variants {
            if let Some(source) = data.get(variant.source_key()) {
                declarations
                    .sources
                    .insert(variant, source.to_str().to_string());
            }
        }
        if declarations
            .sources
            .contains_key(&ShaderVariant::Vertex(VertexVariant::Skinned))
        {
            declarations.set_texture(SKIN_MATRICES, None);
        }

        declarations
    }
}

/// Read `[path, binding, name, flags]` entries. An empty path declares an empty slot.
fn parse_textures(section: &Variant, loader: &dyn ResourceLoader) -> Vec<TextureItem> {
    let mut textures = Vec::new();
    for entry in section.to_list() {
        let fields = entry.to_list();
        if fields.len() < 3 {
            log::warn!("Skipping malformed texture declaration {entry:?}");
            continue;
        }
        let path = fields[0].to_str();
        let texture = if path.is_empty() {
            None
        } else {
            let texture = loader.load_texture(path);
            if texture.is_none() {
                log::warn!("Material texture '{path}' could not be loaded");
            }
            texture
        };
        let mut item = TextureItem::new(fields[2].to_str(), texture.as_ref());
        item.binding = fields[1].to_int();
        item.flags = fields.get(3).map_or(0, |flags| flags.to_int() as u32);
        textures.push(item);
    }
    textures
}

/// Read `[value, size, name]` entries.
fn parse_uniforms(section: &Variant) -> Vec<UniformItem> {
    let mut uniforms = Vec::new();
    for entry in section.to_list() {
        let fields = entry.to_list();
        if fields.len() < 3 {
            log::warn!("Skipping malformed uniform declaration {entry:?}");
            continue;
        }
        uniforms.push(UniformItem {
            name: fields[2].to_str().to_string(),
            value: UniformValue::from_variant(&fields[0]),
            size: fields[1].to_int(),
        });
    }
    uniforms
}

/// A material shared by many instances.
///
/// # Threading
///
/// Declarations live behind a read-write lock and may be replaced from any
/// thread (for example by a loader task). Programs are only built, used and
/// deleted on the render thread through [`Material::get_program`]. Programs
/// still alive when the material is dropped are handed to the
/// [`DeferredReleases`] queue it was created with.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ember_graphics::backend::{DeferredReleases, DummyBackend};
/// use ember_graphics::materials::{
///     FragmentVariant, Material, ShaderVariant, SurfaceType, VariantKey, VertexVariant,
/// };
///
/// let api = DummyBackend::new();
/// let material = Arc::new(Material::new(DeferredReleases::new()));
/// material.set_shader_source(VertexVariant::Static.into(), "void main() {}");
/// material.set_shader_source(FragmentVariant::Default.into(), "void main() {}");
///
/// let instance = material.create_instance(SurfaceType::Static);
/// let key = VariantKey::new(instance.vertex_variant(), FragmentVariant::Default);
/// assert!(material.get_program(&api, key).is_some());
/// ```
pub struct Material {
    declarations: RwLock<Declarations>,
    programs: Mutex<ProgramCache>,
    state: AtomicMaterialState,
    releases: DeferredReleases,
    label: Option<String>,
}

impl Material {
    /// Create an empty material with default properties.
    ///
    /// `releases` receives the material's programs when it is dropped.
    pub fn new(releases: DeferredReleases) -> Self {
        Self {
            declarations: RwLock::new(Declarations::default()),
            programs: Mutex::new(ProgramCache::default()),
            state: AtomicMaterialState::default(),
            releases,
            label: None,
        }
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the material label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Replace every declaration with the contents of serialized material data.
    ///
    /// The new declarations are assembled first and swapped in under a single
    /// write lock, so readers see either the old or the new set, never a mix.
    /// Each section is read independently; a missing or malformed section
    /// falls back to its defaults. Marks the material for rebuild.
    pub fn load_user_data(&self, data: &VariantMap, loader: &dyn ResourceLoader) {
        let parsed = Declarations::parse(data, loader);
        log::debug!(
            "Loaded material {:?}: {} textures, {} uniforms, {} shader sources",
            self.label,
            parsed.textures.len(),
            parsed.uniforms.len(),
            parsed.sources.len()
        );

        let mut declarations = self.declarations.write();
        *declarations = parsed;
        self.state.transition(MaterialState::ToBeUpdated);
    }

    /// Create an instance for drawing `surface` geometry.
    ///
    /// The instance starts with one entry per declared uniform, each reading
    /// this material's current value.
    pub fn create_instance(self: &Arc<Self>, surface: SurfaceType) -> MaterialInstance {
        let mut instance = MaterialInstance::new(Arc::clone(self), surface.vertex_variant());
        for uniform in &self.declarations.read().uniforms {
            instance.declare(&uniform.name, uniform.value.uniform_type());
        }
        instance
    }

    /// Get the program for a variant pair, building programs first if the
    /// material is out of date.
    ///
    /// Must be called on the thread that owns `api`'s context. Returns `None`
    /// for undeclared pairs, failed builds and suspended materials.
    pub fn get_program(&self, api: &dyn GraphicsApi, key: VariantKey) -> Option<ProgramHandle> {
        let mut programs = self.programs.lock();
        // Holding the read lock keeps a concurrent reload from flagging the
        // material between the rebuild and the transition back to Ready.
        let declarations = self.declarations.read();
        match self.state.load() {
            MaterialState::Suspend => {
                programs.release_all(api);
                self.state.transition(MaterialState::ToBeDeleted);
                log::debug!("Released programs of suspended material {:?}", self.label);
                None
            }
            MaterialState::ToBeDeleted => None,
            MaterialState::ToBeUpdated => {
                programs.rebuild(api, &declarations);
                self.state.transition(MaterialState::Ready);
                programs.get(key)
            }
            MaterialState::Ready => programs.get(key),
        }
    }

    /// Number of program cache entries, including failed builds.
    pub fn program_count(&self) -> usize {
        self.programs.lock().len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MaterialState {
        self.state.load()
    }

    /// Mark the material for rebuild. Ignored once suspended.
    pub fn invalidate(&self) {
        self.state.transition(MaterialState::ToBeUpdated);
    }

    /// Release the material's programs on next use. No further builds happen.
    pub fn suspend(&self) {
        self.state.transition(MaterialState::Suspend);
    }

    /// Fixed-function properties.
    pub fn properties(&self) -> MaterialProperties {
        self.declarations.read().properties
    }

    /// Replace all fixed-function properties.
    pub fn set_properties(&self, properties: MaterialProperties) {
        self.declarations.write().properties = properties;
    }

    /// Material type.
    pub fn material_type(&self) -> MaterialType {
        self.properties().material_type
    }

    /// Set the material type.
    pub fn set_material_type(&self, material_type: MaterialType) {
        self.declarations.write().properties.material_type = material_type;
    }

    /// Blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        self.properties().blend_mode
    }

    /// Set the blend mode.
    pub fn set_blend_mode(&self, blend_mode: BlendMode) {
        self.declarations.write().properties.blend_mode = blend_mode;
    }

    /// Light model.
    pub fn light_model(&self) -> LightModel {
        self.properties().light_model
    }

    /// Set the light model.
    pub fn set_light_model(&self, light_model: LightModel) {
        self.declarations.write().properties.light_model = light_model;
    }

    /// Whether both faces are drawn.
    pub fn double_sided(&self) -> bool {
        self.properties().double_sided
    }

    /// Enable or disable drawing of both faces.
    pub fn set_double_sided(&self, double_sided: bool) {
        self.declarations.write().properties.double_sided = double_sided;
    }

    /// Whether the depth test is enabled.
    pub fn depth_test(&self) -> bool {
        self.properties().depth_test
    }

    /// Enable or disable the depth test.
    pub fn set_depth_test(&self, depth_test: bool) {
        self.declarations.write().properties.depth_test = depth_test;
    }

    /// Whether depth writes are enabled.
    pub fn depth_write(&self) -> bool {
        self.properties().depth_write
    }

    /// Enable or disable depth writes.
    pub fn set_depth_write(&self, depth_write: bool) {
        self.declarations.write().properties.depth_write = depth_write;
    }

    /// Number of surfaces.
    pub fn surfaces(&self) -> i32 {
        self.properties().surfaces
    }

    /// Set the number of surfaces.
    pub fn set_surfaces(&self, surfaces: i32) {
        self.declarations.write().properties.surfaces = surfaces;
    }

    /// Declared texture slots, in declaration order.
    pub fn textures(&self) -> Vec<TextureItem> {
        self.declarations.read().textures.clone()
    }

    /// Point a texture slot at `texture`, declaring the slot at the end of the
    /// list if it does not exist yet. Existing slots keep their position.
    pub fn set_texture(&self, name: &str, texture: Option<&Arc<Texture>>) {
        self.declarations.write().set_texture(name, texture);
    }

    /// Declared uniforms, in declaration order.
    pub fn uniforms(&self) -> Vec<UniformItem> {
        self.declarations.read().uniforms.clone()
    }

    /// Current value of a declared uniform.
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        self.declarations
            .read()
            .uniforms
            .iter()
            .find(|uniform| uniform.name == name)
            .map(|uniform| uniform.value)
    }

    /// Set a declared uniform's value, declaring it if needed.
    ///
    /// Instances without an override on `name` pick the new value up at their
    /// next bind. Instances created earlier do not gain newly declared names
    /// in their parameter list, but the value is still uploaded for them.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        let mut declarations = self.declarations.write();
        match declarations.uniforms.iter_mut().find(|u| u.name == name) {
            Some(uniform) => uniform.value = value,
            None => declarations.uniforms.push(UniformItem::new(name, value)),
        }
    }

    /// Raw source of a shader variant.
    pub fn shader_source(&self, variant: ShaderVariant) -> Option<String> {
        self.declarations.read().sources.get(&variant).cloned()
    }

    /// Declared shader variants.
    pub fn shader_variants(&self) -> Vec<ShaderVariant> {
        self.declarations.read().sources.keys().copied().collect()
    }

    /// Set the raw source of a shader variant and mark the material for rebuild.
    pub fn set_shader_source(&self, variant: ShaderVariant, source: impl Into<String>) {
        let mut declarations = self.declarations.write();
        declarations.sources.insert(variant, source.into());
        self.state.transition(MaterialState::ToBeUpdated);
    }

    /// Read access to all declarations for the binding pass.
    pub(crate) fn declarations(&self) -> RwLockReadGuard<'_, Declarations> {
        self.declarations.read()
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        let programs = self.programs.get_mut().take_all();
        if !programs.is_empty() {
            log::trace!(
                "Deferring release of {} programs of material {:?}",
                programs.len(),
                self.label
            );
            self.releases.push_programs(programs);
        }
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("label", &self.label)
            .field("state", &self.state.load())
            .field("properties", &self.properties())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Material: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, TextureHandle};
    use crate::resources::{TextureCache, TextureDescriptor};
    use ember_core::math::Vec4;
    use ember_core::variant::parse_variant_map;

    const DOCUMENT: &str = r#"{
        "Properties": List([Int(0), Bool(false), Int(1), Int(2), Int(1), Bool(true), Bool(false)]),
        "Textures": List([
            List([String("textures/albedo.png"), Int(6), String("mainTexture"), Int(0)]),
            List([String(""), Int(-1), String("normalsMap"), Int(0)]),
        ]),
        "Uniforms": List([List([Vector4((1.0, 0.0, 0.0, 1.0)), Int(16), String("tint")])]),
        "Shader": String("uniform vec4 tint;\nvoid main() {}"),
        "Simple": String("void main() {}"),
        "Static": String("void main() {}"),
        "Skinned": String("uniform sampler2D skinMatrices;\nvoid main() {}"),
    }"#;

    fn loader() -> TextureCache {
        let cache = TextureCache::new();
        cache.insert(
            "textures/albedo.png",
            Texture::new(TextureHandle(10), TextureDescriptor::new_2d(4, 4)),
        );
        cache
    }

    #[test]
    fn test_defaults() {
        let material = Material::new(DeferredReleases::new());
        let properties = material.properties();
        assert_eq!(properties.material_type, MaterialType::Surface);
        assert_eq!(properties.blend_mode, BlendMode::Opaque);
        assert_eq!(properties.light_model, LightModel::Unlit);
        assert!(properties.double_sided);
        assert!(properties.depth_test);
        assert!(properties.depth_write);
        assert_eq!(properties.surfaces, 1);
        assert_eq!(material.state(), MaterialState::Ready);
        assert_eq!(material.program_count(), 0);
    }

    #[test]
    fn test_load_user_data() {
        let loader = loader();
        let material = Material::new(DeferredReleases::new());
        material.load_user_data(&parse_variant_map(DOCUMENT).unwrap(), &loader);

        let properties = material.properties();
        assert!(!properties.double_sided);
        assert_eq!(properties.blend_mode, BlendMode::Translucent);
        assert_eq!(properties.light_model, LightModel::Lit);
        assert!(!properties.depth_write);

        let textures = material.textures();
        let names: Vec<_> = textures.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["mainTexture", "normalsMap", SKIN_MATRICES]);
        assert_eq!(textures[0].binding, 6);
        assert!(textures[0].texture().is_some());
        assert!(textures[1].texture().is_none());

        assert_eq!(
            material.uniform_value("tint"),
            Some(UniformValue::Vector4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
        );
        assert_eq!(material.shader_variants().len(), 4);
        assert_eq!(material.state(), MaterialState::ToBeUpdated);
    }

    #[test]
    fn test_non_surface_ignores_surface_variants() {
        let data = parse_variant_map(
            r#"{
                "Properties": List([Int(1)]),
                "Shader": String("void main() {}"),
                "Simple": String("void main() {}"),
                "Static": String("void main() {}"),
            }"#,
        )
        .unwrap();
        let material = Material::new(DeferredReleases::new());
        material.load_user_data(&data, &TextureCache::new());

        assert_eq!(material.material_type(), MaterialType::PostProcess);
        // Short property lists keep defaults for the missing positions.
        assert!(material.double_sided());
        assert_eq!(
            material.shader_variants(),
            vec![
                ShaderVariant::Vertex(VertexVariant::Static),
                ShaderVariant::Fragment(FragmentVariant::Default),
            ]
        );
    }

    #[test]
    fn test_malformed_sections_fall_back() {
        let data = parse_variant_map(
            r#"{
                "Properties": Int(3),
                "Textures": List([Int(1), List([String(""), Int(0), String("mask")])]),
                "Uniforms": String("oops"),
            }"#,
        )
        .unwrap();
        let material = Material::new(DeferredReleases::new());
        material.set_uniform("stale", 1.0_f32);
        material.load_user_data(&data, &TextureCache::new());

        assert_eq!(material.properties(), MaterialProperties::default());
        assert_eq!(material.textures().len(), 1);
        assert!(material.uniforms().is_empty());
    }

    #[test]
    fn test_set_texture_keeps_order() {
        let material = Material::new(DeferredReleases::new());
        let texture = Arc::new(Texture::new(
            TextureHandle(3),
            TextureDescriptor::new_2d(1, 1),
        ));
        material.set_texture("a", None);
        material.set_texture("b", None);
        material.set_texture("a", Some(&texture));

        let textures = material.textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].name, "a");
        assert!(textures[0].texture().is_some());
    }

    #[test]
    fn test_create_instance_seeds_declared_uniforms() {
        let material = Arc::new(Material::new(DeferredReleases::new()));
        material.set_uniform("tint", Vec4::new(1.0, 0.0, 0.0, 1.0));
        material.set_uniform("roughness", 0.5_f32);

        let instance = material.create_instance(SurfaceType::Billboard);
        assert_eq!(instance.vertex_variant(), VertexVariant::Particle);
        assert_eq!(instance.params().count(), 2);
    }

    #[test]
    fn test_suspend_releases_programs() {
        let api = DummyBackend::new();
        let material = Material::new(DeferredReleases::new());
        material.set_shader_source(VertexVariant::Static.into(), "void main() {}");
        material.set_shader_source(FragmentVariant::Default.into(), "void main() {}");

        let key = VariantKey::new(VertexVariant::Static, FragmentVariant::Default);
        assert!(material.get_program(&api, key).is_some());

        material.suspend();
        assert_eq!(material.get_program(&api, key), None);
        assert_eq!(material.state(), MaterialState::ToBeDeleted);
        assert_eq!(api.live_programs(), 0);

        // Terminal: no rebuild even when invalidated.
        material.invalidate();
        assert_eq!(material.get_program(&api, key), None);
        assert_eq!(api.stats().programs_linked, 1);
    }

    #[test]
    fn test_drop_defers_program_release() {
        let api = DummyBackend::new();
        let releases = DeferredReleases::new();
        let material = Material::new(releases.clone());
        material.set_shader_source(VertexVariant::Static.into(), "void main() {}");
        material.set_shader_source(FragmentVariant::Default.into(), "void main() {}");
        material.set_shader_source(FragmentVariant::Simple.into(), "void main() {}");
        let key = VariantKey::new(VertexVariant::Static, FragmentVariant::Simple);
        assert!(material.get_program(&api, key).is_some());

        drop(material);
        assert_eq!(releases.pending(), 2);
        assert_eq!(releases.process(&api), 2);
        assert_eq!(api.live_programs(), 0);
    }
}
