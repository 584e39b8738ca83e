use glhal_native::{GlAttributes, NativeError};
use glutin::config::{ColorBufferType, Config, ConfigTemplateBuilder};
use glutin::context::{ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;
use std::num::NonZeroU32;
use winit::window::Window;

enum ContextSlot {
    NotCurrent(NotCurrentContext),
    Current(PossiblyCurrentContext),
    Lost,
}

/// glutin display, window surface and context for one window.
pub(crate) struct GlContext {
    // Field order is drop order: context, then surface, then display.
    context: ContextSlot,
    surface: Surface<WindowSurface>,
    display: Display,
}

fn native(e: impl std::fmt::Display) -> NativeError {
    NativeError(e.to_string())
}

impl GlContext {
    pub(crate) fn create(window: &Window, attributes: GlAttributes) -> Result<Self, NativeError> {
        let display_handle = window.display_handle().map_err(native)?.as_raw();
        let window_handle = window.window_handle().map_err(native)?.as_raw();

        #[cfg(target_os = "windows")]
        let preference = DisplayApiPreference::Wgl(Some(window_handle));
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(all(unix, not(target_os = "macos")))]
        let preference = DisplayApiPreference::Egl;

        let display = unsafe { Display::new(display_handle, preference) }.map_err(native)?;
        let config = find_config(&display, attributes)?;

        let (width, height): (u32, u32) = window.inner_size().into();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window_handle,
            NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
        );
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .map_err(native)?;

        let context_attributes = ContextAttributesBuilder::new().build(Some(window_handle));
        let context =
            unsafe { display.create_context(&config, &context_attributes) }.map_err(native)?;

        tracing::debug!(
            "GL config: {:?}, {} alpha bits",
            config.color_buffer_type(),
            config.alpha_size()
        );

        Ok(Self {
            context: ContextSlot::NotCurrent(context),
            surface,
            display,
        })
    }

    pub(crate) fn make_current(&mut self) -> Result<(), NativeError> {
        match std::mem::replace(&mut self.context, ContextSlot::Lost) {
            ContextSlot::NotCurrent(context) => {
                let current = context.make_current(&self.surface).map_err(native)?;
                self.context = ContextSlot::Current(current);
                Ok(())
            }
            ContextSlot::Current(context) => {
                let result = context.make_current(&self.surface).map_err(native);
                self.context = ContextSlot::Current(context);
                result
            }
            ContextSlot::Lost => Err(NativeError::new("GL context is gone")),
        }
    }

    pub(crate) fn load(&self) -> Result<glow::Context, NativeError> {
        if !matches!(self.context, ContextSlot::Current(_)) {
            return Err(NativeError::new("GL context is not current"));
        }
        let display = &self.display;
        Ok(unsafe {
            glow::Context::from_loader_function_cstr(|s: &CStr| display.get_proc_address(s))
        })
    }

    pub(crate) fn swap_buffers(&self) -> Result<(), NativeError> {
        match &self.context {
            ContextSlot::Current(context) => self.surface.swap_buffers(context).map_err(native),
            _ => Err(NativeError::new("GL context is not current")),
        }
    }

    pub(crate) fn resize(&self, width: u32, height: u32) {
        if let (ContextSlot::Current(context), Some(w), Some(h)) =
            (&self.context, NonZeroU32::new(width), NonZeroU32::new(height))
        {
            self.surface.resize(context, w, h);
        }
    }
}

fn find_config(display: &Display, attributes: GlAttributes) -> Result<Config, NativeError> {
    let template = ConfigTemplateBuilder::new()
        .with_buffer_type(ColorBufferType::Rgb {
            r_size: attributes.red_bits,
            g_size: attributes.green_bits,
            b_size: attributes.blue_bits,
        })
        .with_alpha_size(attributes.alpha_bits)
        .with_single_buffering(!attributes.double_buffer)
        .with_transparency(false)
        .build();
    unsafe { display.find_configs(template) }
        .map_err(native)?
        .next()
        .ok_or_else(|| NativeError::new("no GL config matches the requested attributes"))
}
