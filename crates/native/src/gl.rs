use crate::error::{GlError, NativeError};
use std::num::NonZeroU32;

macro_rules! native_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

native_id!(
    /// GL texture object name.
    TextureId
);
native_id!(
    /// GL buffer object name.
    BufferId
);
native_id!(
    /// GL framebuffer object name.
    FramebufferId
);
native_id!(
    /// Linked GL program name.
    ProgramId
);

/// Context version as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
}

impl GlVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Server-side capabilities toggled with enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    DepthTest,
    ScissorTest,
}

/// Buffers affected by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearBuffers {
    Color,
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcAlpha,
    DstColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    ReverseSubtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Points,
    Lines,
    Triangles,
}

/// Pixel-pack parameters consulted by readback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackState {
    /// Pixels per row in the destination; 0 means "same as width".
    pub row_length: i32,
    pub alignment: i32,
}

impl Default for PackState {
    fn default() -> Self {
        Self {
            row_length: 0,
            alignment: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    Incomplete(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// Sampler uniforms take the texture unit index.
    Int(i32),
}

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: i32,
}

/// The OpenGL-style state machine, bound to one context on one thread.
///
/// Methods mirror the native entry points one-to-one and never fail on their
/// own; errors accumulate in the native error flag and are read back with
/// [`GlBackend::get_error`]. Creation calls return the native error string
/// when the driver refuses an allocation.
pub trait GlBackend {
    fn version(&self) -> GlVersion;
    fn renderer(&self) -> String;
    fn has_extension(&self, name: &str) -> bool;

    /// Pop the oldest pending error flag, `None` when clear.
    fn get_error(&self) -> Option<u32>;

    /// False once the owning context has been destroyed. Resources that
    /// outlive their device skip native deletes after this.
    fn is_alive(&self) -> bool;
    fn mark_lost(&self);

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, buffers: ClearBuffers);
    fn enable(&self, cap: Capability);
    fn disable(&self, cap: Capability);
    fn blend_equation(&self, equation: BlendEquation);
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    fn line_width(&self, width: f32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer(&self, attribute: VertexAttribute, stride: i32);
    fn draw_arrays(&self, kind: PrimitiveKind, first: i32, count: i32);

    fn pack_state(&self) -> PackState;
    fn set_pack_state(&self, state: PackState);
    /// Synchronous BGRA readback of the bound read framebuffer into `out`,
    /// honoring the current pack state.
    fn read_pixels_bgra(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]);
    /// Block until every queued command has completed.
    fn finish(&self);

    fn create_texture(&self) -> Result<TextureId, NativeError>;
    fn delete_texture(&self, texture: TextureId);
    fn bind_texture(&self, unit: u32, texture: Option<TextureId>);
    /// Allocate (and optionally fill) BGRA storage for a bound 2D texture.
    fn upload_texture_bgra(&self, texture: TextureId, width: i32, height: i32, data: Option<&[u8]>);

    fn create_buffer(&self) -> Result<BufferId, NativeError>;
    fn delete_buffer(&self, buffer: BufferId);
    fn bind_vertex_buffer(&self, buffer: Option<BufferId>);
    fn allocate_vertex_buffer(&self, buffer: BufferId, size_bytes: usize);
    fn write_vertex_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[u8]);

    fn create_framebuffer(&self) -> Result<FramebufferId, NativeError>;
    fn delete_framebuffer(&self, framebuffer: FramebufferId);
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>);
    fn attach_color_texture(&self, framebuffer: FramebufferId, texture: TextureId);
    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;

    /// Compile both stages, bind each named attribute to its location and
    /// link. The error carries the driver log.
    fn compile_program(
        &self,
        vertex: &str,
        fragment: &str,
        attributes: &[(u32, &str)],
    ) -> Result<ProgramId, NativeError>;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);
    fn set_uniform(&self, program: ProgramId, name: &str, value: Uniform);

    /// Read the error flag after `call` and turn it into a `Result`.
    fn check(&self, call: &'static str) -> Result<(), GlError> {
        match self.get_error() {
            None => Ok(()),
            Some(code) => Err(GlError { call, code }),
        }
    }
}
