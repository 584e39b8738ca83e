use crate::affinity::AffinityViolation;
use glhal_native::{GlError, NativeError};

/// Failure while creating or updating a GPU resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to create {kind}: {message}")]
    Create { kind: &'static str, message: String },
    #[error("no built-in shader named {0:?}")]
    UnknownShader(String),
    #[error("shader {name:?} failed to build: {log}")]
    ShaderCompile { name: String, log: String },
    #[error("frame buffer is incomplete (status 0x{status:04X})")]
    IncompleteFrameBuffer { status: u32 },
    #[error("expected {expected} bytes of pixel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("writing {count} elements at {start} overflows a buffer of {capacity}")]
    OutOfRange {
        start: usize,
        count: usize,
        capacity: usize,
    },
    #[error(transparent)]
    Native(#[from] GlError),
}

/// Every way a [`crate::GraphicsDevice`] operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    ThreadAffinity(#[from] AffinityViolation),
    #[error("graphics initialization failed: {0}")]
    Initialization(String),
    #[error(transparent)]
    NativeState(#[from] GlError),
    #[error("native call failed: {0}")]
    Native(#[from] NativeError),
    #[error("failed to create hardware cursor {name:?}: {message}")]
    CursorCreation { name: String, message: String },
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("graphics device has been disposed")]
    Disposed,
}
