//! Caller-owned GPU resources.
//!
//! Each resource keeps a reference-counted handle to the GL backend that
//! made it and deletes its native object on drop, unless the device has
//! been disposed in the meantime.

mod frame_buffer;
mod shader;
pub mod shaders;
mod texture;
mod vertex_buffer;

pub use frame_buffer::FrameBuffer;
pub use shader::Shader;
pub use texture::Texture;
pub use vertex_buffer::VertexBuffer;

use crate::error::ResourceError;
use bytemuck::{Pod, Zeroable};
use glhal_common::Size;
use glhal_native::{GlBackend, VertexAttribute};

/// Attribute location of vertex positions in every built-in shader.
pub const POSITION_LOCATION: u32 = 0;
/// Attribute location of texture coordinates in every built-in shader.
pub const TEXCOORD_LOCATION: u32 = 1;

/// Resource that can be made current for the next draw.
pub trait Bindable {
    fn bind(&self) -> Result<(), ResourceError>;
}

/// Plain-old-data vertex with a fixed attribute layout.
pub trait VertexLayout: Pod {
    fn attributes() -> &'static [VertexAttribute];
}

/// Default interleaved vertex: position in window pixels plus a texture
/// coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, 0.0],
            texcoord: [u, v],
        }
    }
}

impl VertexLayout for Vertex {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 2] = [
            VertexAttribute {
                location: POSITION_LOCATION,
                components: 3,
                offset: 0,
            },
            VertexAttribute {
                location: TEXCOORD_LOCATION,
                components: 2,
                offset: 12,
            },
        ];
        &ATTRIBUTES
    }
}

pub(crate) fn check(gl: &dyn GlBackend, call: &'static str) -> Result<(), ResourceError> {
    gl.check(call).map_err(|e| {
        tracing::error!(target: "graphics", "{e}");
        ResourceError::Native(e)
    })
}

/// Size as GL extents. Sizes beyond `i32::MAX` saturate; the driver then
/// rejects them with an error flag.
pub(crate) fn extent(size: Size) -> (i32, i32) {
    (
        i32::try_from(size.width).unwrap_or(i32::MAX),
        i32::try_from(size.height).unwrap_or(i32::MAX),
    )
}
