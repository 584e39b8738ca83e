use crate::affinity::ThreadBound;
use crate::config::DeviceConfig;
use crate::cursor::HardwareCursor;
use crate::deferred::{self, DeferredActions, DeferredQueue};
use crate::error::DeviceError;
use crate::render_state;
use crate::resources::extent;
use crate::screenshot;
use glam::IVec2;
use glhal_common::{BlendMode, HostOs, Image, Rect, Size, WindowMode};
use glhal_input::{InputBridge, InputHandler};
use glhal_native::{
    FullscreenMode, GlAttributes, GlBackend, GlVersion, NativeError, NativeEvent, Platform,
    PrimitiveKind, WindowRequest,
};
use std::cell::Cell;
use std::rc::Rc;

/// Native objects still alive, torn down in reverse creation order.
#[derive(Debug, Default, Clone, Copy)]
struct Live {
    library: bool,
    window: bool,
    context: bool,
}

fn teardown(platform: &mut dyn Platform, live: &mut Live, gl: Option<&dyn GlBackend>) {
    if live.context {
        live.context = false;
        if let Some(gl) = gl {
            gl.mark_lost();
        }
        platform.destroy_context();
    }
    if live.window {
        live.window = false;
        platform.destroy_window();
    }
    if live.library {
        live.library = false;
        platform.quit();
    }
}

const MISSING_FRAMEBUFFERS: &str =
    "OpenGL framebuffer objects are not available. Please try updating your graphics driver.";

fn init_error(e: NativeError) -> DeviceError {
    init_failed(e.0)
}

fn init_failed(message: String) -> DeviceError {
    tracing::error!(target: "graphics", "graphics initialization failed: {message}");
    DeviceError::Initialization(message)
}

/// Framebuffer objects are core from GL 3.0 and an extension before.
fn supports_framebuffers(gl: &dyn GlBackend) -> bool {
    gl.version() >= GlVersion::new(3, 0)
        || gl.has_extension("GL_EXT_framebuffer_object")
        || gl.has_extension("GL_ARB_framebuffer_object")
}

/// Everything the device owns. Only reachable on the owning thread.
pub(crate) struct DeviceState {
    pub(crate) platform: Box<dyn Platform>,
    pub(crate) gl: Rc<dyn GlBackend>,
    pub(crate) window_size: Rc<Cell<Size>>,
    pub(crate) queue: DeferredQueue,
    actions: Option<DeferredActions>,
    live: Live,
    bridge: InputBridge,
    events: Vec<NativeEvent>,
    disposed: bool,
}

/// A window with a current GL context, and the rendering contract the
/// engine draws through.
///
/// Every method must be called from the thread that created the device.
pub struct GraphicsDevice {
    state: ThreadBound<DeviceState>,
}

impl GraphicsDevice {
    /// Bring up the native library, a window and a GL context.
    ///
    /// Any failure after the native library starts tears down whatever was
    /// created before the error is returned.
    pub fn new(platform: impl Platform + 'static, config: &DeviceConfig) -> Result<Self, DeviceError> {
        let mut platform: Box<dyn Platform> = Box::new(platform);
        platform.init().map_err(init_error)?;

        let mut live = Live {
            library: true,
            ..Live::default()
        };
        let (gl, size) = match start(platform.as_mut(), config, &mut live) {
            Ok(started) => started,
            Err(e) => {
                teardown(platform.as_mut(), &mut live, None);
                return Err(e);
            }
        };

        let (queue, actions) = deferred::channel();
        Ok(Self {
            state: ThreadBound::new(DeviceState {
                platform,
                gl,
                window_size: Rc::new(Cell::new(size)),
                queue,
                actions: Some(actions),
                live,
                bridge: InputBridge::new(),
                events: Vec::new(),
                disposed: false,
            }),
        })
    }

    pub(crate) fn live(&self) -> Result<&DeviceState, DeviceError> {
        let state = self.state.get()?;
        if state.disposed {
            return Err(DeviceError::Disposed);
        }
        Ok(state)
    }

    pub(crate) fn live_mut(&mut self) -> Result<&mut DeviceState, DeviceError> {
        let state = self.state.get_mut()?;
        if state.disposed {
            return Err(DeviceError::Disposed);
        }
        Ok(state)
    }

    /// Run pending deferred actions, then destroy the context, the window
    /// and the native library. Calling it again does nothing.
    pub fn dispose(&mut self) -> Result<(), DeviceError> {
        let state = self.state.get_mut()?;
        if state.disposed {
            return Ok(());
        }
        state.disposed = true;
        if let Some(actions) = state.actions.take() {
            actions.drain(state.platform.as_mut());
        }
        teardown(
            state.platform.as_mut(),
            &mut state.live,
            Some(state.gl.as_ref()),
        );
        tracing::info!("graphics device disposed");
        Ok(())
    }

    pub fn is_disposed(&self) -> Result<bool, DeviceError> {
        Ok(self.state.get()?.disposed)
    }

    pub fn window_size(&self) -> Result<Size, DeviceError> {
        Ok(self.live()?.window_size.get())
    }

    /// Swap the back buffer to the window.
    pub fn present(&mut self) -> Result<(), DeviceError> {
        self.live_mut()?.platform.swap_buffers()?;
        Ok(())
    }

    pub fn grab_window_mouse_focus(&mut self) -> Result<(), DeviceError> {
        self.live_mut()?.platform.set_window_grab(true);
        Ok(())
    }

    pub fn release_window_mouse_focus(&mut self) -> Result<(), DeviceError> {
        self.live_mut()?.platform.set_window_grab(false);
        Ok(())
    }

    /// Per-frame safe point: run every action scheduled through
    /// [`GraphicsDevice::deferred_queue`]. Returns how many ran.
    pub fn end_frame(&mut self) -> Result<usize, DeviceError> {
        let state = self.live_mut()?;
        let ran = match state.actions.as_ref() {
            Some(actions) => actions.drain(state.platform.as_mut()),
            None => 0,
        };
        Ok(ran)
    }

    /// Handle for scheduling work onto the owning thread from anywhere.
    pub fn deferred_queue(&self) -> Result<DeferredQueue, DeviceError> {
        Ok(self.live()?.queue.clone())
    }

    /// Poll the native pump once and forward every event to `handler`.
    pub fn pump_input(&mut self, handler: &mut dyn InputHandler) -> Result<(), DeviceError> {
        let state = self.live_mut()?;
        let mut events = std::mem::take(&mut state.events);
        state.platform.poll_events(&mut events);
        for event in events.drain(..) {
            if let NativeEvent::Resized(size) = event {
                state.window_size.set(size);
            }
            state.bridge.forward(event, handler);
        }
        state.events = events;
        Ok(())
    }

    pub fn get_clipboard_text(&mut self) -> Result<Option<String>, DeviceError> {
        Ok(self.live_mut()?.platform.clipboard_text())
    }

    pub fn set_clipboard_text(&mut self, text: &str) -> Result<bool, DeviceError> {
        Ok(self.live_mut()?.platform.set_clipboard_text(text))
    }

    /// Clear the color buffer to opaque black.
    pub fn clear(&self) -> Result<(), DeviceError> {
        render_state::clear(self.live()?.gl.as_ref())
    }

    /// Clear the depth buffer and enable depth testing.
    pub fn enable_depth_buffer(&self) -> Result<(), DeviceError> {
        render_state::enable_depth_buffer(self.live()?.gl.as_ref())
    }

    pub fn disable_depth_buffer(&self) -> Result<(), DeviceError> {
        render_state::disable_depth_buffer(self.live()?.gl.as_ref())
    }

    pub fn set_blend_mode(&self, mode: BlendMode) -> Result<(), DeviceError> {
        render_state::set_blend_mode(self.live()?.gl.as_ref(), mode)
    }

    /// Restrict drawing to a rect given in window pixels, origin top-left.
    pub fn enable_scissor(&self, left: i32, top: i32, width: i32, height: i32) -> Result<(), DeviceError> {
        let state = self.live()?;
        let (_, window_height) = extent(state.window_size.get());
        render_state::enable_scissor(
            state.gl.as_ref(),
            Rect::new(left, top, width, height),
            window_height,
        )
    }

    pub fn disable_scissor(&self) -> Result<(), DeviceError> {
        render_state::disable_scissor(self.live()?.gl.as_ref())
    }

    pub fn set_line_width(&self, width: f32) -> Result<(), DeviceError> {
        render_state::set_line_width(self.live()?.gl.as_ref(), width)
    }

    /// Draw `count` vertices from the bound vertex buffer, starting at
    /// `first`.
    pub fn draw_primitives(&self, kind: PrimitiveKind, first: i32, count: i32) -> Result<(), DeviceError> {
        let gl = self.live()?.gl.as_ref();
        gl.draw_arrays(kind, first, count);
        render_state::check(gl, "glDrawArrays")
    }

    /// Build a hardware cursor from `size` ARGB pixels (bytes B, G, R, A).
    pub fn create_hardware_cursor(
        &mut self,
        name: &str,
        size: Size,
        pixels: &[u8],
        hotspot: IVec2,
    ) -> Result<HardwareCursor, DeviceError> {
        let state = self.live_mut()?;
        let queue = state.queue.clone();
        HardwareCursor::create(state.platform.as_mut(), queue, name, size, pixels, hotspot)
    }

    /// Show `cursor`, or hide the system cursor for `None` or a released
    /// cursor.
    pub fn set_hardware_cursor(&mut self, cursor: Option<&HardwareCursor>) -> Result<(), DeviceError> {
        let platform = self.live_mut()?.platform.as_mut();
        match cursor.and_then(HardwareCursor::cursor_id) {
            Some(id) => {
                platform.show_cursor(true);
                platform.set_cursor(id);
            }
            None => platform.show_cursor(false),
        }
        Ok(())
    }

    /// Read the window contents back as a top-down BGRA image. Blocks until
    /// rendering completes.
    pub fn take_screenshot(&self) -> Result<Image, DeviceError> {
        let state = self.live()?;
        screenshot::capture(state.gl.as_ref(), state.window_size.get())
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        if !self.state.is_owner() {
            return;
        }
        if let Err(e) = self.dispose() {
            tracing::error!(target: "graphics", "failed to dispose graphics device: {e}");
        }
    }
}

/// Startup steps after the native library is up. Records each created
/// object in `live` so the caller can unwind on failure.
fn start(
    platform: &mut dyn Platform,
    config: &DeviceConfig,
    live: &mut Live,
) -> Result<(Rc<dyn GlBackend>, Size), DeviceError> {
    platform.set_gl_attributes(GlAttributes::default());

    let desktop = platform.desktop_size().map_err(init_error)?;
    tracing::info!("Desktop resolution: {desktop}");
    let size = if config.size.is_zero() {
        tracing::info!("No custom resolution provided, using desktop resolution");
        desktop
    } else {
        config.size
    };
    tracing::info!("Using resolution: {size}");

    platform
        .create_window(&WindowRequest {
            title: config.title.clone(),
            size,
            centered: true,
            opengl: true,
        })
        .map_err(init_error)?;
    live.window = true;

    platform.set_window_grab(config.lock_mouse);
    match config.window_mode {
        WindowMode::Windowed => {}
        WindowMode::Fullscreen => {
            platform
                .set_fullscreen(FullscreenMode::Exclusive)
                .map_err(init_error)?;
        }
        WindowMode::PseudoFullscreen => {
            // The macOS window server leaves the window offset otherwise.
            if platform.host() == HostOs::MacOs {
                platform.set_window_position(IVec2::ZERO);
            }
            platform
                .set_fullscreen(FullscreenMode::Desktop)
                .map_err(init_error)?;
            platform.set_minimize_on_focus_loss(false);
        }
    }

    platform.create_context().map_err(init_error)?;
    live.context = true;
    platform.make_current().map_err(init_error)?;
    let gl = platform.load_gl().map_err(init_error)?;
    tracing::info!(
        "Using {} with OpenGL renderer: {}",
        platform.name(),
        gl.renderer()
    );

    if !supports_framebuffers(gl.as_ref()) {
        return Err(init_failed(MISSING_FRAMEBUFFERS.into()));
    }

    for index in [crate::resources::POSITION_LOCATION, crate::resources::TEXCOORD_LOCATION] {
        gl.enable_vertex_attrib_array(index);
        render_state::check(gl.as_ref(), "glEnableVertexAttribArray")?;
    }
    Ok((gl, size))
}
