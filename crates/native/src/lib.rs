//! Native seam: the operations the device layer needs from a windowing
//! library and an OpenGL-style state machine.
//!
//! # Invariants
//! - Everything here is single-threaded. Implementations are free to hold
//!   thread-bound native handles; callers enforce affinity.
//! - State calls do not report errors themselves. Callers poll
//!   [`GlBackend::check`] after each call.
//!
//! Concrete backends live in their own crates. The `testing` feature adds
//! in-memory fakes that record every call.

pub mod error;
pub mod event;
pub mod gl;
pub mod platform;

#[cfg(feature = "testing")]
pub mod testing;

pub use error::{GlError, NativeError};
pub use event::{Key, Modifiers, MouseButton, NativeEvent};
pub use gl::{
    BlendEquation, BlendFactor, BufferId, Capability, ClearBuffers, FramebufferId,
    FramebufferStatus, GlBackend, GlVersion, PackState, PrimitiveKind, ProgramId, TextureId,
    Uniform, VertexAttribute,
};
pub use platform::{
    CursorId, FullscreenMode, GlAttributes, Platform, SurfaceFormat, SurfaceId, WindowRequest,
};
