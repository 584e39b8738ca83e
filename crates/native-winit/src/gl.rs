use glhal_native::{
    BlendEquation, BlendFactor, BufferId, Capability, ClearBuffers, FramebufferId,
    FramebufferStatus, GlBackend, GlVersion, NativeError, PackState, PrimitiveKind, ProgramId,
    TextureId, Uniform, VertexAttribute,
};
use glow::{HasContext, PixelPackData, PixelUnpackData};
use std::cell::Cell;

/// [`GlBackend`] over a loaded `glow` context.
///
/// Every method must run on the thread where the context is current.
pub struct GlowBackend {
    gl: glow::Context,
    alive: Cell<bool>,
    vertex_array: Option<glow::VertexArray>,
}

impl GlowBackend {
    pub fn new(gl: glow::Context) -> Self {
        // Core profiles reject attribute setup without a bound vertex array.
        let vertex_array = if gl.version().major >= 3 {
            unsafe {
                match gl.create_vertex_array() {
                    Ok(vao) => {
                        gl.bind_vertex_array(Some(vao));
                        Some(vao)
                    }
                    Err(e) => {
                        tracing::warn!("failed to create default vertex array: {e}");
                        None
                    }
                }
            }
        } else {
            None
        };
        Self {
            gl,
            alive: Cell::new(true),
            vertex_array,
        }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn bind_texture_2d(&self, texture: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
        }
    }

    fn delete_stages(&self, program: glow::Program, stages: &[glow::Shader]) {
        unsafe {
            for &stage in stages {
                self.gl.detach_shader(program, stage);
                self.gl.delete_shader(stage);
            }
        }
    }
}

impl Drop for GlowBackend {
    fn drop(&mut self) {
        let Some(vao) = self.vertex_array.take() else {
            return;
        };
        if self.alive.get() {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }
}

fn capability(cap: Capability) -> u32 {
    match cap {
        Capability::Blend => glow::BLEND,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::ScissorTest => glow::SCISSOR_TEST,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
    }
}

fn primitive(kind: PrimitiveKind) -> u32 {
    match kind {
        PrimitiveKind::Points => glow::POINTS,
        PrimitiveKind::Lines => glow::LINES,
        PrimitiveKind::Triangles => glow::TRIANGLES,
    }
}

impl GlBackend for GlowBackend {
    fn version(&self) -> GlVersion {
        let version = self.gl.version();
        GlVersion::new(version.major, version.minor)
    }

    fn renderer(&self) -> String {
        let (renderer, vendor, version) = unsafe {
            (
                self.gl.get_parameter_string(glow::RENDERER),
                self.gl.get_parameter_string(glow::VENDOR),
                self.gl.get_parameter_string(glow::VERSION),
            )
        };
        format!("{} [{}], {}", renderer.trim(), vendor.trim(), version.trim())
    }

    fn has_extension(&self, name: &str) -> bool {
        self.gl.supported_extensions().contains(name)
    }

    fn get_error(&self) -> Option<u32> {
        let code = unsafe { self.gl.get_error() };
        (code != glow::NO_ERROR).then_some(code)
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn mark_lost(&self) {
        self.alive.set(false);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, buffers: ClearBuffers) {
        let mask = match buffers {
            ClearBuffers::Color => glow::COLOR_BUFFER_BIT,
            ClearBuffers::Depth => glow::DEPTH_BUFFER_BIT,
        };
        unsafe { self.gl.clear(mask) }
    }

    fn enable(&self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) }
    }

    fn disable(&self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) }
    }

    fn blend_equation(&self, equation: BlendEquation) {
        let mode = match equation {
            BlendEquation::Add => glow::FUNC_ADD,
            BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        };
        unsafe { self.gl.blend_equation(mode) }
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) }
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) }
    }

    fn line_width(&self, width: f32) {
        unsafe { self.gl.line_width(width) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(&self, attribute: VertexAttribute, stride: i32) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components,
                glow::FLOAT,
                false,
                stride,
                attribute.offset,
            )
        }
    }

    fn draw_arrays(&self, kind: PrimitiveKind, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive(kind), first, count) }
    }

    fn pack_state(&self) -> PackState {
        unsafe {
            PackState {
                row_length: self.gl.get_parameter_i32(glow::PACK_ROW_LENGTH),
                alignment: self.gl.get_parameter_i32(glow::PACK_ALIGNMENT),
            }
        }
    }

    fn set_pack_state(&self, state: PackState) {
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ROW_LENGTH, state.row_length);
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, state.alignment);
        }
    }

    fn read_pixels_bgra(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]) {
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width,
                height,
                glow::BGRA,
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(out)),
            )
        }
    }

    fn finish(&self) {
        unsafe { self.gl.finish() }
    }

    fn create_texture(&self) -> Result<TextureId, NativeError> {
        let texture = unsafe { self.gl.create_texture() }.map_err(NativeError)?;
        self.bind_texture_2d(TextureId(texture.0));
        unsafe {
            let gl = &self.gl;
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }
        Ok(TextureId(texture.0))
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn upload_texture_bgra(&self, texture: TextureId, width: i32, height: i32, data: Option<&[u8]>) {
        self.bind_texture_2d(texture);
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::BGRA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(data),
            );
        }
    }

    fn create_buffer(&self) -> Result<BufferId, NativeError> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(NativeError)?;
        Ok(BufferId(buffer.0))
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn bind_vertex_buffer(&self, buffer: Option<BufferId>) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, buffer.map(|b| glow::NativeBuffer(b.0)))
        }
    }

    fn allocate_vertex_buffer(&self, buffer: BufferId, size_bytes: usize) {
        self.bind_vertex_buffer(Some(buffer));
        let size = i32::try_from(size_bytes).unwrap_or(i32::MAX);
        unsafe {
            self.gl
                .buffer_data_size(glow::ARRAY_BUFFER, size, glow::DYNAMIC_DRAW)
        }
    }

    fn write_vertex_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[u8]) {
        self.bind_vertex_buffer(Some(buffer));
        let offset = i32::try_from(offset_bytes).unwrap_or(i32::MAX);
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset, data)
        }
    }

    fn create_framebuffer(&self) -> Result<FramebufferId, NativeError> {
        let framebuffer = unsafe { self.gl.create_framebuffer() }.map_err(NativeError)?;
        Ok(FramebufferId(framebuffer.0))
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(framebuffer.0))
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|f| glow::NativeFramebuffer(f.0)),
            )
        }
    }

    fn attach_color_texture(&self, framebuffer: FramebufferId, texture: TextureId) {
        self.bind_framebuffer(Some(framebuffer));
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(glow::NativeTexture(texture.0)),
                0,
            )
        }
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        self.bind_framebuffer(Some(framebuffer));
        match unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) } {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            status => FramebufferStatus::Incomplete(status),
        }
    }

    fn compile_program(
        &self,
        vertex: &str,
        fragment: &str,
        attributes: &[(u32, &str)],
    ) -> Result<ProgramId, NativeError> {
        let gl = &self.gl;
        unsafe {
            let program = gl.create_program().map_err(NativeError)?;
            let mut stages = Vec::with_capacity(2);
            for (kind, source) in [(glow::VERTEX_SHADER, vertex), (glow::FRAGMENT_SHADER, fragment)] {
                let stage = match gl.create_shader(kind) {
                    Ok(stage) => stage,
                    Err(e) => {
                        self.delete_stages(program, &stages);
                        gl.delete_program(program);
                        return Err(NativeError(e));
                    }
                };
                gl.shader_source(stage, source);
                gl.compile_shader(stage);
                if !gl.get_shader_compile_status(stage) {
                    let log = gl.get_shader_info_log(stage);
                    gl.delete_shader(stage);
                    self.delete_stages(program, &stages);
                    gl.delete_program(program);
                    return Err(NativeError(log));
                }
                gl.attach_shader(program, stage);
                stages.push(stage);
            }

            for &(location, name) in attributes {
                gl.bind_attrib_location(program, location, name);
            }
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            self.delete_stages(program, &stages);
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(NativeError(log));
            }
            Ok(ProgramId(program.0))
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) }
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: Uniform) {
        let program = glow::NativeProgram(program.0);
        unsafe {
            self.gl.use_program(Some(program));
            let Some(location) = self.gl.get_uniform_location(program, name) else {
                tracing::debug!("uniform {name} is not active");
                return;
            };
            match value {
                Uniform::Float(v) => self.gl.uniform_1_f32(Some(&location), v),
                Uniform::Vec2([x, y]) => self.gl.uniform_2_f32(Some(&location), x, y),
                Uniform::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(Some(&location), x, y, z, w),
                Uniform::Int(v) => self.gl.uniform_1_i32(Some(&location), v),
            }
        }
    }
}
