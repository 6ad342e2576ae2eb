//! OpenGL backend built on `glow`.
//!
//! Handles are the raw GL object names. The backend must be used on the
//! thread that owns the GL context.

use std::num::NonZeroU32;

use ember_core::mesh::PrimitiveTopology;
use ember_core::uniform::UniformData;
use glow::HasContext;

use crate::error::GraphicsError;
use crate::pipeline::{BlendFactor, BlendOperation, CullFace, DepthState, PipelineState};
use crate::resources::Texture;

use super::{
    BufferHandle, ClearRequest, DrawCall, FramebufferHandle, GraphicsApi, ProgramHandle, Rect,
    ShaderHandle, ShaderStage, TextureTarget, UniformLocation, VertexArrayHandle,
};

fn native<T>(raw: u32, wrap: impl FnOnce(NonZeroU32) -> T) -> Option<T> {
    NonZeroU32::new(raw).map(wrap)
}

fn primitive_mode(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::TriangleList => glow::TRIANGLES,
        PrimitiveTopology::LineList => glow::LINES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveTopology::LineStrip => glow::LINE_STRIP,
        PrimitiveTopology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

fn blend_equation(operation: BlendOperation) -> u32 {
    match operation {
        BlendOperation::Add => glow::FUNC_ADD,
        BlendOperation::Subtract => glow::FUNC_SUBTRACT,
        BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
    }
}

/// OpenGL 3.3+ / GLES 3.0+ backend.
pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    /// Wrap a GL context that is current on this thread.
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Borrow the underlying context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

impl std::fmt::Debug for GlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlBackend").finish_non_exhaustive()
    }
}

impl GraphicsApi for GlBackend {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GraphicsError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(GraphicsError::ResourceCreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GraphicsError::ShaderCompilationFailed { stage, log });
            }
            Ok(ShaderHandle(shader.0.get()))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        if let Some(shader) = native(shader.0, glow::NativeShader) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError> {
        let (Some(vertex), Some(fragment)) = (
            native(vertex.0, glow::NativeShader),
            native(fragment.0, glow::NativeShader),
        ) else {
            return Err(GraphicsError::InvalidParameter(
                "null shader handle".to_string(),
            ));
        };
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GraphicsError::ProgramLinkFailed(log));
            }
            Ok(ProgramHandle(program.0.get()))
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        if let Some(program) = native(program.0, glow::NativeProgram) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn use_program(&self, program: ProgramHandle) {
        unsafe {
            self.gl
                .use_program(native(program.0, glow::NativeProgram))
        };
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = native(program.0, glow::NativeProgram)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|l| UniformLocation(l.0))
    }

    fn set_uniform(&self, location: UniformLocation, data: UniformData<'_>) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match data {
                UniformData::Integer(values) => self.gl.uniform_1_i32_slice(location, values),
                UniformData::Float(values) => self.gl.uniform_1_f32_slice(location, values),
                UniformData::Vector2(values) => self
                    .gl
                    .uniform_2_f32_slice(location, bytemuck::cast_slice(values)),
                UniformData::Vector3(values) => self
                    .gl
                    .uniform_3_f32_slice(location, bytemuck::cast_slice(values)),
                UniformData::Vector4(values) => self
                    .gl
                    .uniform_4_f32_slice(location, bytemuck::cast_slice(values)),
                UniformData::Matrix4(values) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, bytemuck::cast_slice(values))
                }
            }
        }
    }

    fn apply_pipeline_state(&self, state: &PipelineState) {
        unsafe {
            match state.depth {
                DepthState::Disabled => self.gl.disable(glow::DEPTH_TEST),
                DepthState::Enabled { write } => {
                    self.gl.enable(glow::DEPTH_TEST);
                    self.gl.depth_mask(write);
                }
            }

            match state.cull {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(match face {
                        CullFace::Front => glow::FRONT,
                        CullFace::Back => glow::BACK,
                    });
                }
                None => self.gl.disable(glow::CULL_FACE),
            }

            match state.blend {
                Some(blend) => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_func(
                        blend_factor(blend.src_factor),
                        blend_factor(blend.dst_factor),
                    );
                    self.gl.blend_equation(blend_equation(blend.operation));
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn bind_texture(&self, unit: u32, texture: &Texture) {
        let target = match texture.target() {
            TextureTarget::Texture2d => glow::TEXTURE_2D,
            TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
        };
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(target, native(texture.handle().0, glow::NativeTexture));
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        let vertex_array = vertex_array.and_then(|v| native(v.0, glow::NativeVertexArray));
        unsafe { self.gl.bind_vertex_array(vertex_array) };
    }

    fn upload_buffer(&self, buffer: BufferHandle, data: &[u8]) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, native(buffer.0, glow::NativeBuffer));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::DYNAMIC_DRAW);
        }
    }

    fn draw(&self, call: &DrawCall) {
        let mode = primitive_mode(call.topology);
        let Some((count, instances)) = call.signed_counts() else {
            log::warn!(
                "Skipping draw of {} elements x {} instances: exceeds GL limits",
                call.elements,
                call.instances
            );
            return;
        };
        unsafe {
            match (call.is_indexed(), call.instances > 1) {
                (true, false) => self.gl.draw_elements(mode, count, glow::UNSIGNED_INT, 0),
                (true, true) => {
                    self.gl
                        .draw_elements_instanced(mode, count, glow::UNSIGNED_INT, 0, instances)
                }
                (false, false) => self.gl.draw_arrays(mode, 0, count),
                (false, true) => self.gl.draw_arrays_instanced(mode, 0, count, instances),
            }
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>, _level: u32) {
        let framebuffer = framebuffer.and_then(|f| native(f.0, glow::NativeFramebuffer));
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
    }

    fn clear(&self, request: &ClearRequest) {
        let mut mask = 0;
        unsafe {
            if let Some(color) = request.color {
                self.gl.clear_color(color.x, color.y, color.z, color.w);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if let Some(depth) = request.depth {
                // Depth clears are masked by the depth write flag.
                self.gl.depth_mask(true);
                self.gl.clear_depth_f32(depth);
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            if mask != 0 {
                self.gl.clear(mask);
            }
        }
    }

    fn set_viewport(&self, viewport: Rect) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height)
        };
    }

    fn set_scissor(&self, scissor: Option<Rect>) {
        unsafe {
            match scissor {
                Some(rect) => {
                    self.gl.enable(glow::SCISSOR_TEST);
                    self.gl.scissor(rect.x, rect.y, rect.width, rect.height);
                }
                None => self.gl.disable(glow::SCISSOR_TEST),
            }
        }
    }

    fn finish(&self) {
        unsafe { self.gl.finish() };
    }
}
