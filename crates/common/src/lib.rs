//! Shared value types used across the graphics device layer.
//!
//! Nothing in here touches a native API: sizes, rectangles, window and blend
//! modes, and the CPU-side image buffer produced by framebuffer readback.

pub mod image;
pub mod types;

pub use glam::{IVec2, Vec2};
pub use image::{Image, ImageError};
pub use types::{BlendMode, HostOs, Rect, Size, WindowMode};
