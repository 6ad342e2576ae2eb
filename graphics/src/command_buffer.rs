//! Draw recording against a graphics backend.
//!
//! The [`CommandBuffer`] owns the backend and the per-frame state every draw
//! reads: camera matrices, the draw color, frame-global uniforms and texture
//! overrides. Each draw binds its material instance through the material
//! binding protocol and skips silently when the instance cannot draw in the
//! requested layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use ember_core::math::{Mat4, Vec4};
use ember_core::profiling::{frame_mark, profile_function, profile_plot};
use ember_core::uniform::UniformValue;

use crate::backend::{
    ClearRequest, DeferredReleases, DrawCall, GraphicsApi, ProgramHandle, Rect,
};
use crate::materials::{
    bind_instance, FrameBindings, Material, MaterialInstance, RenderLayer, TextureItem,
};
use crate::mesh::Mesh;
use crate::resources::{RenderTarget, Texture};
use crate::settings::RenderSettings;

/// Name of the global carrying `(1 / width, 1 / height, width, height)`.
pub const SCREEN_UNIFORM: &str = "camera.screen";

/// Per-draw vertex stage data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBufferObject {
    /// Model matrix.
    pub model: Mat4,
    /// View matrix.
    pub view: Mat4,
    /// Projection matrix.
    pub projection: Mat4,
}

impl Default for VertexBufferObject {
    fn default() -> Self {
        Self {
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

/// Per-draw fragment stage data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentBufferObject {
    /// Draw color.
    pub color: Vec4,
    /// Clip threshold.
    pub clip: f32,
    /// Time in seconds.
    pub time: f32,
}

/// Counters accumulated since the last [`CommandBuffer::begin_frame`].
///
/// Both counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws issued to the backend.
    pub draw_calls: u32,
    /// Primitives those draws produced.
    pub polygons: u32,
}

/// Records draws for one graphics context.
///
/// # Example
///
/// ```
/// use ember_core::math::Mat4;
/// use ember_graphics::backend::{DummyBackend, VertexArrayHandle};
/// use ember_graphics::materials::{RenderLayer, SurfaceType};
/// use ember_graphics::mesh::{Lod, Mesh, PrimitiveTopology};
/// use ember_graphics::CommandBuffer;
///
/// let mut buffer = CommandBuffer::new(DummyBackend::new());
/// let material = buffer.create_material();
/// let instance = material.create_instance(SurfaceType::Static);
/// let mesh = Mesh::new(PrimitiveTopology::TriangleList).with_lod(Lod {
///     vertex_count: 3,
///     index_count: 3,
///     vertex_array: VertexArrayHandle(1),
/// });
///
/// buffer.begin_frame();
/// // No shader sources are declared, so there is no program to draw with.
/// buffer.draw_mesh(&Mat4::identity(), &mesh, 0, RenderLayer::DEFAULT, &instance);
/// buffer.finish();
/// assert_eq!(buffer.stats().draw_calls, 0);
/// ```
pub struct CommandBuffer<A: GraphicsApi> {
    api: A,
    settings: RenderSettings,
    vertex: VertexBufferObject,
    fragment: FragmentBufferObject,
    saved_view: Mat4,
    saved_projection: Mat4,
    globals: BTreeMap<String, UniformValue>,
    global_textures: Vec<TextureItem>,
    releases: DeferredReleases,
    stats: FrameStats,
}

impl<A: GraphicsApi> CommandBuffer<A> {
    /// Create a command buffer with default settings.
    pub fn new(api: A) -> Self {
        Self::with_settings(api, RenderSettings::default())
    }

    /// Create a command buffer with explicit settings.
    pub fn with_settings(api: A, settings: RenderSettings) -> Self {
        log::debug!("Creating command buffer on {} backend", api.name());
        Self {
            api,
            settings,
            vertex: VertexBufferObject::default(),
            fragment: FragmentBufferObject {
                color: settings.initial_color,
                clip: settings.clip,
                time: 0.0,
            },
            saved_view: Mat4::identity(),
            saved_projection: Mat4::identity(),
            globals: BTreeMap::new(),
            global_textures: Vec::new(),
            releases: DeferredReleases::new(),
            stats: FrameStats::default(),
        }
    }

    /// Get the backend.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Get the settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Queue through which materials return programs to this context.
    pub fn releases(&self) -> &DeferredReleases {
        &self.releases
    }

    /// Create a material whose programs are released through this buffer.
    pub fn create_material(&self) -> Arc<Material> {
        Arc::new(Material::new(self.releases.clone()))
    }

    /// Start a frame.
    ///
    /// Deletes programs of dropped materials, resets the frame counters and
    /// clears frame-global uniforms and texture overrides.
    ///
    /// The time uploaded with every draw is not advanced here; call
    /// [`set_time`](Self::set_time) once per frame with the elapsed time.
    pub fn begin_frame(&mut self) {
        profile_function!();
        let released = self.releases.process(&self.api);
        if released > 0 {
            log::trace!("Released {released} programs");
        }
        self.stats = FrameStats::default();
        self.globals.clear();
        self.global_textures.clear();
    }

    /// Finish the frame.
    pub fn finish(&mut self) {
        profile_function!();
        self.api.finish();
        self.releases.process(&self.api);
        profile_plot!("draw_calls", self.stats.draw_calls as f64);
        profile_plot!("polygons", self.stats.polygons as f64);
        frame_mark!();
    }

    /// Get the counters of the current frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Draw LOD 0 of `mesh` with `instance`.
    ///
    /// Nothing is drawn if the instance is gated out of `layer` or its
    /// program is unavailable.
    pub fn draw_mesh(
        &mut self,
        transform: &Mat4,
        mesh: &Mesh,
        sub_mesh: u32,
        layer: RenderLayer,
        instance: &MaterialInstance,
    ) {
        profile_function!();
        let (Some(lod), Some(call)) = (mesh.lod(0), mesh.draw_call(0, 1)) else {
            log::warn!("Mesh {:?} has no levels of detail", mesh.label());
            return;
        };

        self.vertex.model = *transform;
        if self.bind(instance, layer).is_none() {
            return;
        }

        log::trace!("Drawing {:?} sub-mesh {sub_mesh}", mesh.label());
        self.api.bind_vertex_array(Some(lod.vertex_array));
        self.api.draw(&call);
        self.api.bind_vertex_array(None);

        self.record(&call);
    }

    /// Draw LOD 0 of `mesh` once per transform.
    ///
    /// The transforms are uploaded to the mesh's instance buffer and the
    /// model matrix is reset to identity.
    pub fn draw_mesh_instanced(
        &mut self,
        transforms: &[Mat4],
        mesh: &Mesh,
        sub_mesh: u32,
        layer: RenderLayer,
        instance: &MaterialInstance,
    ) {
        profile_function!();
        if transforms.is_empty() {
            return;
        }
        let Some(lod) = mesh.lod(0) else {
            log::warn!("Mesh {:?} has no levels of detail", mesh.label());
            return;
        };
        let Some(buffer) = mesh.instance_buffer() else {
            log::warn!("Mesh {:?} has no instance buffer", mesh.label());
            return;
        };
        let Some(call) = mesh.draw_call(0, transforms.len() as u32) else {
            return;
        };

        self.vertex.model = Mat4::identity();
        if self.bind(instance, layer).is_none() {
            return;
        }

        log::trace!(
            "Drawing {} instances of {:?} sub-mesh {sub_mesh}",
            transforms.len(),
            mesh.label()
        );
        self.api.upload_buffer(buffer, bytemuck::cast_slice(transforms));
        self.api.bind_vertex_array(Some(lod.vertex_array));
        self.api.draw(&call);
        self.api.bind_vertex_array(None);

        self.record(&call);
    }

    fn record(&mut self, call: &DrawCall) {
        self.stats.draw_calls = self.stats.draw_calls.saturating_add(1);
        self.stats.polygons = self.stats.polygons.saturating_add(call.polygon_count());
    }

    fn bind(
        &self,
        instance: &MaterialInstance,
        layer: RenderLayer,
    ) -> Option<ProgramHandle> {
        let frame = FrameBindings {
            vertex: &self.vertex,
            fragment: &self.fragment,
            slots: &self.settings.slots,
            globals: &self.globals,
            global_textures: &self.global_textures,
        };
        bind_instance(&self.api, instance, &frame, layer)
    }

    /// Redirect draws into `target` at mip `level`.
    pub fn set_render_target(&mut self, target: &RenderTarget, level: u32) {
        log::trace!("Render target {:?} level {level}", target.label());
        self.api.bind_framebuffer(target.framebuffer(), level);
    }

    /// Clear the bound render target.
    pub fn clear_render_target(
        &mut self,
        clear_color: bool,
        color: Vec4,
        clear_depth: bool,
        depth: f32,
    ) {
        let request = ClearRequest {
            color: clear_color.then_some(color),
            depth: clear_depth.then_some(depth),
        };
        if request.color.is_some() || request.depth.is_some() {
            self.api.clear(&request);
        }
    }

    /// Set the camera matrices, remembering the previous ones.
    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.saved_view = self.vertex.view;
        self.saved_projection = self.vertex.projection;
        self.vertex.view = view;
        self.vertex.projection = projection;
    }

    /// Restore the camera matrices replaced by the last
    /// [`set_view_projection`](Self::set_view_projection).
    pub fn reset_view_projection(&mut self) {
        self.vertex.view = self.saved_view;
        self.vertex.projection = self.saved_projection;
    }

    /// Get the current view matrix.
    pub fn view(&self) -> &Mat4 {
        &self.vertex.view
    }

    /// Get the current projection matrix.
    pub fn projection(&self) -> &Mat4 {
        &self.vertex.projection
    }

    /// Set a uniform uploaded, by name, to every program bound this frame.
    pub fn set_global_value(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.globals.insert(name.to_string(), value.into());
    }

    /// Get a frame-global uniform.
    pub fn global_value(&self, name: &str) -> Option<&UniformValue> {
        self.globals.get(name)
    }

    /// Override a texture slot of every material bound this frame.
    ///
    /// Instance overrides still take precedence.
    pub fn set_global_texture(&mut self, name: &str, texture: Option<&Arc<Texture>>) {
        match self.global_textures.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                item.texture = texture.map(Arc::downgrade).unwrap_or_default();
            }
            None => self.global_textures.push(TextureItem::new(name, texture)),
        }
    }

    /// Get a frame-global texture override, if it is still alive.
    pub fn global_texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.global_textures
            .iter()
            .find(|item| item.name == name)
            .and_then(TextureItem::texture)
    }

    /// Set the viewport and publish its size as [`SCREEN_UNIFORM`].
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.api.set_viewport(Rect::new(x, y, width, height));
        let (w, h) = (width as f32, height as f32);
        self.set_global_value(SCREEN_UNIFORM, Vec4::new(1.0 / w, 1.0 / h, w, h));
    }

    /// Restrict drawing to a rectangle.
    pub fn enable_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.api.set_scissor(Some(Rect::new(x, y, width, height)));
    }

    /// Remove the scissor rectangle.
    pub fn disable_scissor(&mut self) {
        self.api.set_scissor(None);
    }

    /// Set the draw color.
    pub fn set_color(&mut self, color: Vec4) {
        self.fragment.color = color;
    }

    /// Get the draw color.
    pub fn color(&self) -> Vec4 {
        self.fragment.color
    }

    /// Set the time uploaded with every draw.
    ///
    /// The value is kept until the next call, so it goes stale unless it is
    /// updated every frame.
    pub fn set_time(&mut self, time: f32) {
        self.fragment.time = time;
    }
}

impl<A: GraphicsApi> std::fmt::Debug for CommandBuffer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("backend", &self.api.name())
            .field("globals", &self.globals.len())
            .field("global_textures", &self.global_textures.len())
            .field("stats", &self.stats)
            .finish()
    }
}
