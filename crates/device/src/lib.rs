//! Graphics device: the rendering contract the engine sees.
//!
//! # Invariants
//! - One device per window; every operation runs on the thread that
//!   created it and fails with [`DeviceError::ThreadAffinity`] elsewhere.
//! - Once disposed, every operation fails with [`DeviceError::Disposed`];
//!   disposing again is a no-op.
//! - Render state is not cached. Each call issues a fresh native state
//!   change followed by an error check.
//! - GPU resources are `!Send`. Hardware cursors are `Send` and release
//!   their native handles through the deferred queue on the owning thread.

pub mod affinity;
pub mod config;
pub mod cursor;
pub mod deferred;
pub mod device;
pub mod error;
pub mod render_state;
pub mod resources;
mod factory;
mod screenshot;

pub use affinity::{AffinityViolation, ThreadBound};
pub use config::DeviceConfig;
pub use cursor::HardwareCursor;
pub use deferred::DeferredQueue;
pub use device::GraphicsDevice;
pub use error::{DeviceError, ResourceError};
pub use render_state::{BlendFunc, blend_func, scissor_box};
pub use resources::{
    Bindable, FrameBuffer, Shader, Texture, Vertex, VertexBuffer, VertexLayout,
};
