use crate::error::NativeError;
use crate::event::NativeEvent;
use crate::gl::GlBackend;
use glam::IVec2;
use glhal_common::{HostOs, Size};
use std::num::NonZeroU32;
use std::rc::Rc;

/// Off-screen pixel surface used to build a cursor image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub NonZeroU32);

/// Native hardware cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(pub NonZeroU32);

/// Framebuffer attributes fixed before the window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlAttributes {
    pub double_buffer: bool,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
}

impl Default for GlAttributes {
    /// Double-buffered RGB, 8 bits per channel, no alpha.
    fn default() -> Self {
        Self {
            double_buffer: true,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 0,
        }
    }
}

/// Pixel layout of a surface: bit depth and channel masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub bits_per_pixel: u8,
    pub a_mask: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
}

impl SurfaceFormat {
    /// 32-bit ARGB. In little-endian memory each pixel reads B, G, R, A.
    pub const ARGB8888: SurfaceFormat = SurfaceFormat {
        bits_per_pixel: 32,
        a_mask: 0xFF00_0000,
        r_mask: 0x00FF_0000,
        g_mask: 0x0000_FF00,
        b_mask: 0x0000_00FF,
    };

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel / 8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub title: String,
    pub size: Size,
    pub centered: bool,
    /// Window must accept a GL context.
    pub opengl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenMode {
    /// Exclusive mode switch.
    Exclusive,
    /// Borderless window sized to the desktop.
    Desktop,
}

/// Windowing library: process-wide init/quit, one window, one GL context,
/// cursor images, the event pump and the clipboard.
///
/// Mirrors the shape of SDL-style C APIs. Teardown methods are safe to call
/// when the matching object does not exist.
pub trait Platform {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;
    fn host(&self) -> HostOs;

    fn init(&mut self) -> Result<(), NativeError>;
    fn quit(&mut self);

    /// Must be called before `create_window`; later calls have no effect.
    fn set_gl_attributes(&mut self, attributes: GlAttributes);
    fn desktop_size(&mut self) -> Result<Size, NativeError>;

    fn create_window(&mut self, request: &WindowRequest) -> Result<(), NativeError>;
    fn destroy_window(&mut self);
    fn set_window_grab(&mut self, grab: bool);
    fn set_fullscreen(&mut self, mode: FullscreenMode) -> Result<(), NativeError>;
    fn set_window_position(&mut self, position: IVec2);
    fn set_minimize_on_focus_loss(&mut self, minimize: bool);

    fn create_context(&mut self) -> Result<(), NativeError>;
    fn make_current(&mut self) -> Result<(), NativeError>;
    /// Resolve GL entry points for the current context.
    fn load_gl(&mut self) -> Result<Rc<dyn GlBackend>, NativeError>;
    fn destroy_context(&mut self);
    fn swap_buffers(&mut self) -> Result<(), NativeError>;

    fn create_surface(&mut self, size: Size, format: SurfaceFormat) -> Result<SurfaceId, NativeError>;
    /// Copy `pixels` byte-for-byte into the surface. Fails when the length
    /// does not match the surface size.
    fn write_surface_pixels(&mut self, surface: SurfaceId, pixels: &[u8]) -> Result<(), NativeError>;
    fn free_surface(&mut self, surface: SurfaceId);
    fn create_color_cursor(&mut self, surface: SurfaceId, hotspot: IVec2) -> Result<CursorId, NativeError>;
    fn free_cursor(&mut self, cursor: CursorId);
    fn show_cursor(&mut self, visible: bool);
    fn set_cursor(&mut self, cursor: CursorId);

    /// Drain every pending event into `out`.
    fn poll_events(&mut self, out: &mut Vec<NativeEvent>);
    fn clipboard_text(&mut self) -> Option<String>;
    fn set_clipboard_text(&mut self, text: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_masks_are_fixed() {
        let f = SurfaceFormat::ARGB8888;
        assert_eq!(f.a_mask, 0xFF000000);
        assert_eq!(f.r_mask, 0x00FF0000);
        assert_eq!(f.g_mask, 0x0000FF00);
        assert_eq!(f.b_mask, 0x000000FF);
        assert_eq!(f.bytes_per_pixel(), 4);
    }

    #[test]
    fn default_attributes_are_double_buffered_rgb() {
        let a = GlAttributes::default();
        assert!(a.double_buffer);
        assert_eq!((a.red_bits, a.green_bits, a.blue_bits), (8, 8, 8));
        assert_eq!(a.alpha_bits, 0);
    }
}
