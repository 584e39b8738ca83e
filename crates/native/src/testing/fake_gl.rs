use crate::error::NativeError;
use crate::gl::{
    BlendEquation, BlendFactor, BufferId, Capability, ClearBuffers, FramebufferId,
    FramebufferStatus, GlBackend, GlVersion, PackState, PrimitiveKind, ProgramId, TextureId,
    Uniform, VertexAttribute,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::num::NonZeroU32;

/// One recorded call against [`FakeGl`].
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    ClearColor([f32; 4]),
    Clear(ClearBuffers),
    Enable(Capability),
    Disable(Capability),
    BlendEquation(BlendEquation),
    BlendFunc(BlendFactor, BlendFactor),
    Scissor {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    LineWidth(f32),
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        attribute: VertexAttribute,
        stride: i32,
    },
    DrawArrays {
        kind: PrimitiveKind,
        first: i32,
        count: i32,
    },
    SetPackState(PackState),
    ReadPixels {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Finish,
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    BindTexture {
        unit: u32,
        texture: Option<TextureId>,
    },
    UploadTexture {
        texture: TextureId,
        width: i32,
        height: i32,
        bytes: Option<usize>,
    },
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindVertexBuffer(Option<BufferId>),
    AllocateVertexBuffer {
        buffer: BufferId,
        size: usize,
    },
    WriteVertexBuffer {
        buffer: BufferId,
        offset: usize,
        len: usize,
    },
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    AttachColorTexture {
        framebuffer: FramebufferId,
        texture: TextureId,
    },
    CompileProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: Uniform,
    },
}

/// Recording GL backend with a single-color framebuffer.
///
/// `clear(Color)` paints the whole framebuffer with the current clear color,
/// and readback returns it honoring the pack state, so readback paths can be
/// tested without a driver.
pub struct FakeGl {
    calls: RefCell<Vec<GlCall>>,
    errors: RefCell<VecDeque<u32>>,
    extensions: RefCell<Vec<String>>,
    version: Cell<GlVersion>,
    alive: Cell<bool>,
    next_id: Cell<u32>,
    clear_color: Cell<[f32; 4]>,
    fill: Cell<[u8; 4]>,
    scripted_pixels: RefCell<Option<Vec<u8>>>,
    pack: Cell<PackState>,
    fail_create: RefCell<Option<String>>,
    fail_compile: RefCell<Option<String>>,
    framebuffer_status: Cell<FramebufferStatus>,
}

impl Default for FakeGl {
    fn default() -> Self {
        Self {
            calls: RefCell::default(),
            errors: RefCell::default(),
            extensions: RefCell::new(vec!["GL_EXT_framebuffer_object".into()]),
            version: Cell::new(GlVersion::new(2, 1)),
            alive: Cell::new(true),
            next_id: Cell::new(0),
            clear_color: Cell::new([0.0; 4]),
            fill: Cell::new([0; 4]),
            scripted_pixels: RefCell::default(),
            pack: Cell::new(PackState::default()),
            fail_create: RefCell::default(),
            fail_compile: RefCell::default(),
            framebuffer_status: Cell::new(FramebufferStatus::Complete),
        }
    }
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn count(&self, pred: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Queue an error flag for the next `get_error`.
    pub fn push_error(&self, code: u32) {
        self.errors.borrow_mut().push_back(code);
    }

    pub fn set_extensions(&self, extensions: &[&str]) {
        *self.extensions.borrow_mut() = extensions.iter().map(|e| e.to_string()).collect();
    }

    pub fn set_version(&self, version: GlVersion) {
        self.version.set(version);
    }

    /// Next `create_*` call fails with `message`.
    pub fn fail_next_create(&self, message: &str) {
        *self.fail_create.borrow_mut() = Some(message.into());
    }

    pub fn fail_next_compile(&self, log: &str) {
        *self.fail_compile.borrow_mut() = Some(log.into());
    }

    pub fn set_framebuffer_status(&self, status: FramebufferStatus) {
        self.framebuffer_status.set(status);
    }

    /// Replace the framebuffer with tightly packed BGRA rows, bottom row
    /// first, the way the driver stores them.
    pub fn set_framebuffer_pixels(&self, pixels: Vec<u8>) {
        *self.scripted_pixels.borrow_mut() = Some(pixels);
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_id(&self) -> Result<NonZeroU32, NativeError> {
        if let Some(message) = self.fail_create.borrow_mut().take() {
            return Err(NativeError(message));
        }
        let id = NonZeroU32::MIN.saturating_add(self.next_id.get());
        self.next_id.set(id.get());
        Ok(id)
    }
}

impl GlBackend for FakeGl {
    fn version(&self) -> GlVersion {
        self.version.get()
    }

    fn renderer(&self) -> String {
        "FakeGL".into()
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.borrow().iter().any(|e| e == name)
    }

    fn get_error(&self) -> Option<u32> {
        self.errors.borrow_mut().pop_front()
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn mark_lost(&self) {
        self.alive.set(false);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color.set([r, g, b, a]);
        self.record(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear(&self, buffers: ClearBuffers) {
        if buffers == ClearBuffers::Color {
            let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            let [r, g, b, a] = self.clear_color.get();
            self.fill.set([to_byte(b), to_byte(g), to_byte(r), to_byte(a)]);
            self.scripted_pixels.borrow_mut().take();
        }
        self.record(GlCall::Clear(buffers));
    }

    fn enable(&self, cap: Capability) {
        self.record(GlCall::Enable(cap));
    }

    fn disable(&self, cap: Capability) {
        self.record(GlCall::Disable(cap));
    }

    fn blend_equation(&self, equation: BlendEquation) {
        self.record(GlCall::BlendEquation(equation));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc(src, dst));
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Scissor {
            x,
            y,
            width,
            height,
        });
    }

    fn line_width(&self, width: f32) {
        self.record(GlCall::LineWidth(width));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(&self, attribute: VertexAttribute, stride: i32) {
        self.record(GlCall::VertexAttribPointer { attribute, stride });
    }

    fn draw_arrays(&self, kind: PrimitiveKind, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { kind, first, count });
    }

    fn pack_state(&self) -> PackState {
        self.pack.get()
    }

    fn set_pack_state(&self, state: PackState) {
        self.pack.set(state);
        self.record(GlCall::SetPackState(state));
    }

    fn read_pixels_bgra(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]) {
        self.record(GlCall::ReadPixels {
            x,
            y,
            width,
            height,
        });
        let pack = self.pack.get();
        let (width, height) = (width.max(0) as usize, height.max(0) as usize);
        let row_pixels = if pack.row_length > 0 {
            pack.row_length as usize
        } else {
            width
        };
        let align = pack.alignment.max(1) as usize;
        let row_bytes = (row_pixels * 4).div_ceil(align) * align;
        let scripted = self.scripted_pixels.borrow();
        for row in 0..height {
            for col in 0..width {
                let px = match scripted.as_deref() {
                    Some(pixels) => {
                        let at = (row * width + col) * 4;
                        [pixels[at], pixels[at + 1], pixels[at + 2], pixels[at + 3]]
                    }
                    None => self.fill.get(),
                };
                let at = row * row_bytes + col * 4;
                if let Some(dst) = out.get_mut(at..at + 4) {
                    dst.copy_from_slice(&px);
                }
            }
        }
    }

    fn finish(&self) {
        self.record(GlCall::Finish);
    }

    fn create_texture(&self) -> Result<TextureId, NativeError> {
        let id = TextureId(self.next_id()?);
        self.record(GlCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        self.record(GlCall::BindTexture { unit, texture });
    }

    fn upload_texture_bgra(&self, texture: TextureId, width: i32, height: i32, data: Option<&[u8]>) {
        self.record(GlCall::UploadTexture {
            texture,
            width,
            height,
            bytes: data.map(<[u8]>::len),
        });
    }

    fn create_buffer(&self) -> Result<BufferId, NativeError> {
        let id = BufferId(self.next_id()?);
        self.record(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn bind_vertex_buffer(&self, buffer: Option<BufferId>) {
        self.record(GlCall::BindVertexBuffer(buffer));
    }

    fn allocate_vertex_buffer(&self, buffer: BufferId, size_bytes: usize) {
        self.record(GlCall::AllocateVertexBuffer {
            buffer,
            size: size_bytes,
        });
    }

    fn write_vertex_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[u8]) {
        self.record(GlCall::WriteVertexBuffer {
            buffer,
            offset: offset_bytes,
            len: data.len(),
        });
    }

    fn create_framebuffer(&self) -> Result<FramebufferId, NativeError> {
        let id = FramebufferId(self.next_id()?);
        self.record(GlCall::CreateFramebuffer(id));
        Ok(id)
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        self.record(GlCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        self.record(GlCall::BindFramebuffer(framebuffer));
    }

    fn attach_color_texture(&self, framebuffer: FramebufferId, texture: TextureId) {
        self.record(GlCall::AttachColorTexture {
            framebuffer,
            texture,
        });
    }

    fn framebuffer_status(&self, _framebuffer: FramebufferId) -> FramebufferStatus {
        self.framebuffer_status.get()
    }

    fn compile_program(
        &self,
        _vertex: &str,
        _fragment: &str,
        _attributes: &[(u32, &str)],
    ) -> Result<ProgramId, NativeError> {
        if let Some(log) = self.fail_compile.borrow_mut().take() {
            return Err(NativeError(log));
        }
        let id = ProgramId(self.next_id()?);
        self.record(GlCall::CompileProgram(id));
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(GlCall::UseProgram(program));
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: Uniform) {
        self.record(GlCall::SetUniform {
            program,
            name: name.into(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_reports_queued_errors_once() {
        let gl = FakeGl::new();
        gl.push_error(0x0502);
        assert_eq!(gl.check("glEnable").unwrap_err().code, 0x0502);
        assert!(gl.check("glEnable").is_ok());
    }

    #[test]
    fn readback_honors_row_length() {
        let gl = FakeGl::new();
        gl.clear_color(1.0, 0.0, 0.0, 1.0);
        gl.clear(ClearBuffers::Color);
        gl.set_pack_state(PackState {
            row_length: 3,
            alignment: 1,
        });
        let mut out = vec![0u8; 3 * 4 * 2];
        gl.read_pixels_bgra(0, 0, 2, 2, &mut out);
        assert_eq!(&out[0..4], &[0, 0, 255, 255]);
        assert_eq!(&out[8..12], &[0, 0, 0, 0], "padding pixel left untouched");
        assert_eq!(&out[12..16], &[0, 0, 255, 255]);
    }

    #[test]
    fn create_failure_is_one_shot() {
        let gl = FakeGl::new();
        gl.fail_next_create("out of memory");
        assert_eq!(gl.create_texture().unwrap_err().message(), "out of memory");
        assert!(gl.create_texture().is_ok());
    }
}
