//! Input bridge: native events in, engine-facing [`InputEvent`]s out.
//!
//! # Invariants
//! - Mouse events always carry the last known cursor location and the
//!   modifier state current when they were produced.
//! - Translation never drops a quit request.

pub mod bridge;
pub mod event;
pub mod handler;

pub use bridge::InputBridge;
pub use event::{InputEvent, KeyEventKind, KeyInput, MouseEventKind, MouseInput};
pub use glhal_native::{Key, Modifiers, MouseButton};
pub use handler::InputHandler;
