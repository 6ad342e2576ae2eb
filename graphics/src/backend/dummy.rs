//! Dummy graphics backend for testing and headless runs.
//!
//! This backend doesn't talk to a GPU. It keeps enough state to behave like an
//! immediate-mode API (current program, bound textures, applied pipeline state)
//! and records every call in [`BackendStats`], so tests can assert on exactly
//! what the binding protocol did.
//!
//! Shader "compilation" scans the source for `uniform <type> <name>;`
//! declarations. Declared uniforms get locations starting at
//! [`FIRST_DECLARED_LOCATION`]; locations below it are treated as explicitly
//! laid out and accepted for every program. A source containing `#error`
//! fails to compile.

use std::collections::{BTreeMap, HashMap};

use ember_core::uniform::{UniformData, UniformType};
use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::pipeline::PipelineState;
use crate::resources::Texture;

use super::{
    BufferHandle, ClearRequest, DrawCall, FramebufferHandle, GraphicsApi, ProgramHandle, Rect,
    ShaderHandle, ShaderStage, TextureHandle, UniformLocation, VertexArrayHandle,
};

/// Location assigned to the first uniform declared in a program's sources.
pub const FIRST_DECLARED_LOCATION: u32 = 16;

/// Call counters collected by [`DummyBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Successful shader compilations.
    pub shaders_compiled: u32,
    /// Failed shader compilations.
    pub shader_compile_failures: u32,
    /// Shader deletions.
    pub shaders_deleted: u32,
    /// Successful program links.
    pub programs_linked: u32,
    /// Failed program links.
    pub program_link_failures: u32,
    /// Program deletions.
    pub programs_deleted: u32,
    /// Pipeline state applications.
    pub pipeline_state_changes: u32,
    /// Uniform uploads.
    pub uniform_uploads: u32,
    /// Texture binds.
    pub texture_binds: u32,
    /// Buffer uploads.
    pub buffer_uploads: u32,
    /// Draw calls.
    pub draw_calls: u32,
}

/// The last value uploaded to a uniform location.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUniform {
    /// Element type of the upload.
    pub ty: UniformType,
    /// Number of elements uploaded.
    pub count: usize,
    /// Flattened components.
    pub values: Vec<f32>,
}

#[derive(Debug)]
struct DummyShader {
    stage: ShaderStage,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct DummyProgram {
    uniforms: Vec<String>,
    values: HashMap<UniformLocation, RecordedUniform>,
}

impl DummyProgram {
    fn location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformLocation(FIRST_DECLARED_LOCATION + index as u32))
    }
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u32,
    shaders: HashMap<ShaderHandle, DummyShader>,
    programs: HashMap<ProgramHandle, DummyProgram>,
    current_program: Option<ProgramHandle>,
    pipeline_state: Option<PipelineState>,
    bound_textures: BTreeMap<u32, TextureHandle>,
    vertex_array: Option<VertexArrayHandle>,
    framebuffer: Option<(Option<FramebufferHandle>, u32)>,
    viewport: Option<Rect>,
    scissor: Option<Rect>,
    last_clear: Option<ClearRequest>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    draws: Vec<DrawCall>,
    stats: BackendStats,
}

impl DummyState {
    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Scan shader source for uniform declarations, in declaration order.
fn parse_uniforms(source: &str) -> Vec<String> {
    let mut uniforms = Vec::new();
    for statement in source.split(';') {
        let mut tokens = statement.split_whitespace();
        if tokens.by_ref().any(|token| token == "uniform") {
            // Skip the type, keep the name without any array suffix.
            if let Some(name) = tokens.nth(1) {
                let name = name.split('[').next().unwrap_or(name);
                if !name.is_empty() {
                    uniforms.push(name.to_string());
                }
            }
        }
    }
    uniforms
}

/// Dummy graphics backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> BackendStats {
        self.state.lock().stats
    }

    /// Reset the call counters and the recorded draw list.
    pub fn reset_stats(&self) {
        let mut state = self.state.lock();
        state.stats = BackendStats::default();
        state.draws.clear();
    }

    /// Number of programs linked and not yet deleted.
    pub fn live_programs(&self) -> usize {
        self.state.lock().programs.len()
    }

    /// Returns `true` if the program exists and has not been deleted.
    pub fn is_program_alive(&self, program: ProgramHandle) -> bool {
        self.state.lock().programs.contains_key(&program)
    }

    /// The program made current by the last `use_program`.
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.lock().current_program
    }

    /// The last pipeline state applied.
    pub fn pipeline_state(&self) -> Option<PipelineState> {
        self.state.lock().pipeline_state
    }

    /// Texture bound to each unit.
    pub fn bound_textures(&self) -> BTreeMap<u32, TextureHandle> {
        self.state.lock().bound_textures.clone()
    }

    /// Forget all texture bindings.
    pub fn unbind_textures(&self) {
        self.state.lock().bound_textures.clear();
    }

    /// The currently bound vertex array.
    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.state.lock().vertex_array
    }

    /// Last value uploaded to a location of a program.
    pub fn uniform_at(
        &self,
        program: ProgramHandle,
        location: UniformLocation,
    ) -> Option<RecordedUniform> {
        let state = self.state.lock();
        state.programs.get(&program)?.values.get(&location).cloned()
    }

    /// Last value uploaded to a named uniform of a program.
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<RecordedUniform> {
        let state = self.state.lock();
        let program = state.programs.get(&program)?;
        program.values.get(&program.location(name)?).cloned()
    }

    /// Flattened components of the last value uploaded to a named uniform.
    pub fn uniform_floats(&self, program: ProgramHandle, name: &str) -> Option<Vec<f32>> {
        self.uniform(program, name).map(|uniform| uniform.values)
    }

    /// Every draw issued since the last [`reset_stats`](Self::reset_stats).
    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.lock().draws.clone()
    }

    /// Contents of a buffer after its last upload.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// The bound framebuffer and level, once one has been bound.
    pub fn framebuffer(&self) -> Option<(Option<FramebufferHandle>, u32)> {
        self.state.lock().framebuffer
    }

    /// The current viewport.
    pub fn viewport(&self) -> Option<Rect> {
        self.state.lock().viewport
    }

    /// The current scissor rectangle, `None` while scissoring is disabled.
    pub fn scissor(&self) -> Option<Rect> {
        self.state.lock().scissor
    }

    /// The last clear issued.
    pub fn last_clear(&self) -> Option<ClearRequest> {
        self.state.lock().last_clear
    }
}

impl GraphicsApi for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GraphicsError> {
        let mut state = self.state.lock();
        if let Some(line) = source.lines().position(|line| line.contains("#error")) {
            state.stats.shader_compile_failures += 1;
            return Err(GraphicsError::ShaderCompilationFailed {
                stage,
                log: format!("ERROR: 0:{}: '#error' : user error directive", line + 1),
            });
        }

        let handle = ShaderHandle(state.allocate_id());
        state.shaders.insert(
            handle,
            DummyShader {
                stage,
                uniforms: parse_uniforms(source),
            },
        );
        state.stats.shaders_compiled += 1;
        log::trace!("DummyBackend: compiled {:?} shader {:?}", stage, handle);
        Ok(handle)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if state.shaders.remove(&shader).is_some() {
            state.stats.shaders_deleted += 1;
        }
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError> {
        let mut state = self.state.lock();
        let stages = (
            state.shaders.get(&vertex).map(|s| s.stage),
            state.shaders.get(&fragment).map(|s| s.stage),
        );
        if stages != (Some(ShaderStage::Vertex), Some(ShaderStage::Fragment)) {
            state.stats.program_link_failures += 1;
            return Err(GraphicsError::ProgramLinkFailed(format!(
                "expected a vertex and a fragment shader, got {stages:?}"
            )));
        }

        let mut uniforms: Vec<String> = Vec::new();
        for shader in [vertex, fragment] {
            if let Some(shader) = state.shaders.get(&shader) {
                for name in &shader.uniforms {
                    if !uniforms.contains(name) {
                        uniforms.push(name.clone());
                    }
                }
            }
        }

        let handle = ProgramHandle(state.allocate_id());
        state.programs.insert(
            handle,
            DummyProgram {
                uniforms,
                values: HashMap::new(),
            },
        );
        state.stats.programs_linked += 1;
        log::trace!("DummyBackend: linked program {:?}", handle);
        Ok(handle)
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        if state.programs.remove(&program).is_some() {
            state.stats.programs_deleted += 1;
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: ProgramHandle) {
        self.state.lock().current_program = Some(program);
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.state.lock().programs.get(&program)?.location(name)
    }

    fn set_uniform(&self, location: UniformLocation, data: UniformData<'_>) {
        let mut state = self.state.lock();
        let Some(current) = state.current_program else {
            log::warn!("DummyBackend: uniform upload with no program in use");
            return;
        };
        state.stats.uniform_uploads += 1;
        if let Some(program) = state.programs.get_mut(&current) {
            program.values.insert(
                location,
                RecordedUniform {
                    ty: data.uniform_type(),
                    count: data.len(),
                    values: data.to_floats(),
                },
            );
        }
    }

    fn apply_pipeline_state(&self, pipeline: &PipelineState) {
        let mut state = self.state.lock();
        state.pipeline_state = Some(*pipeline);
        state.stats.pipeline_state_changes += 1;
    }

    fn bind_texture(&self, unit: u32, texture: &Texture) {
        let mut state = self.state.lock();
        state.bound_textures.insert(unit, texture.handle());
        state.stats.texture_binds += 1;
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.state.lock().vertex_array = vertex_array;
    }

    fn upload_buffer(&self, buffer: BufferHandle, data: &[u8]) {
        let mut state = self.state.lock();
        state.buffers.insert(buffer, data.to_vec());
        state.stats.buffer_uploads += 1;
    }

    fn draw(&self, call: &DrawCall) {
        let mut state = self.state.lock();
        state.draws.push(*call);
        state.stats.draw_calls += 1;
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>, level: u32) {
        self.state.lock().framebuffer = Some((framebuffer, level));
    }

    fn clear(&self, request: &ClearRequest) {
        self.state.lock().last_clear = Some(*request);
    }

    fn set_viewport(&self, viewport: Rect) {
        self.state.lock().viewport = Some(viewport);
    }

    fn set_scissor(&self, scissor: Option<Rect>) {
        self.state.lock().scissor = scissor;
    }

    fn finish(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "uniform mat4 skin[64];\nvoid main() {}";
    const FRAGMENT: &str = "uniform vec4 tint;\nuniform sampler2D mainTexture;\nvoid main() {}";

    #[test]
    fn test_parse_uniforms() {
        assert_eq!(
            parse_uniforms("layout(location = 0) uniform mat4 model;\nuniform float t[4];"),
            vec!["model".to_string(), "t".to_string()]
        );
        assert!(parse_uniforms("void main() {}").is_empty());
    }

    #[test]
    fn test_compile_and_link() {
        let api = DummyBackend::new();
        let vs = api.compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = api.compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = api.link_program(vs, fs).unwrap();

        assert_eq!(
            api.uniform_location(program, "skin"),
            Some(UniformLocation(FIRST_DECLARED_LOCATION))
        );
        assert_eq!(
            api.uniform_location(program, "mainTexture"),
            Some(UniformLocation(FIRST_DECLARED_LOCATION + 2))
        );
        assert_eq!(api.uniform_location(program, "missing"), None);

        let stats = api.stats();
        assert_eq!(stats.shaders_compiled, 2);
        assert_eq!(stats.programs_linked, 1);
    }

    #[test]
    fn test_error_directive_fails_compilation() {
        let api = DummyBackend::new();
        let result = api.compile_shader(ShaderStage::Fragment, "void main() {}\n#error broken");
        assert!(matches!(
            result,
            Err(GraphicsError::ShaderCompilationFailed {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
        assert_eq!(api.stats().shader_compile_failures, 1);
    }

    #[test]
    fn test_link_rejects_swapped_stages() {
        let api = DummyBackend::new();
        let vs = api.compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = api.compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert!(api.link_program(fs, vs).is_err());
        assert_eq!(api.stats().program_link_failures, 1);
    }

    #[test]
    fn test_uniform_upload_targets_current_program() {
        let api = DummyBackend::new();
        let vs = api.compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = api.compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = api.link_program(vs, fs).unwrap();

        let location = api.uniform_location(program, "tint").unwrap();
        let tint = [ember_core::math::Vec4::new(0.0, 1.0, 0.0, 1.0)];

        // No program in use: dropped.
        api.set_uniform(location, UniformData::Vector4(&tint));
        assert_eq!(api.uniform_floats(program, "tint"), None);

        api.use_program(program);
        api.set_uniform(location, UniformData::Vector4(&tint));
        assert_eq!(
            api.uniform_floats(program, "tint"),
            Some(vec![0.0, 1.0, 0.0, 1.0])
        );

        api.delete_program(program);
        assert!(!api.is_program_alive(program));
        assert_eq!(api.current_program(), None);
    }
}
