use crate::context::GlContext;
use crate::events::translate;
use crate::gl::GlowBackend;
use glam::IVec2;
use glhal_common::{HostOs, Size};
use glhal_native::{
    CursorId, FullscreenMode, GlAttributes, GlBackend, NativeError, NativeEvent, Platform,
    SurfaceFormat, SurfaceId, WindowRequest,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, CustomCursor, Fullscreen, Window, WindowId};

thread_local! {
    // winit allows one event loop per process and cannot rebuild it, so a
    // quit parks the loop here for the next init on this thread.
    static PARKED_LOOP: RefCell<Option<EventLoop<()>>> = const { RefCell::new(None) };
}

/// Pumps the loop once, running an optional task with the active loop and
/// buffering window events for the next poll.
struct Pump<'a, F, R> {
    task: Option<F>,
    output: Option<R>,
    events: &'a mut Vec<WindowEvent>,
}

impl<F, R> Pump<'_, F, R>
where
    F: FnOnce(&ActiveEventLoop) -> R,
{
    fn run_task(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(task) = self.task.take() {
            self.output = Some(task(event_loop));
        }
    }
}

impl<F, R> ApplicationHandler for Pump<'_, F, R>
where
    F: FnOnce(&ActiveEventLoop) -> R,
{
    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        self.run_task(event_loop);
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.run_task(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.events.push(event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.run_task(event_loop);
    }
}

type IdleTask = fn(&ActiveEventLoop);

/// Cursor image staged in memory until it becomes a native cursor.
struct CursorSurface {
    size: Size,
    bgra: Vec<u8>,
}

/// [`Platform`] backed by winit windows, glutin contexts and arboard.
pub struct WinitPlatform {
    event_loop: Option<EventLoop<()>>,
    attributes: GlAttributes,
    // Dropped before the window it renders to.
    gl: Option<GlContext>,
    window: Option<Window>,
    surfaces: HashMap<SurfaceId, CursorSurface>,
    cursors: HashMap<CursorId, CustomCursor>,
    next_id: u32,
    pending: Vec<WindowEvent>,
    exited: bool,
    minimize_on_focus_loss: bool,
    clipboard: Option<arboard::Clipboard>,
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitPlatform {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            attributes: GlAttributes::default(),
            gl: None,
            window: None,
            surfaces: HashMap::new(),
            cursors: HashMap::new(),
            next_id: 0,
            pending: Vec::new(),
            exited: false,
            minimize_on_focus_loss: true,
            clipboard: None,
        }
    }

    fn next_id(&mut self) -> NonZeroU32 {
        let id = NonZeroU32::MIN.saturating_add(self.next_id);
        self.next_id = id.get();
        id
    }

    fn window(&self) -> Result<&Window, NativeError> {
        self.window
            .as_ref()
            .ok_or_else(|| NativeError::new("no window"))
    }

    /// Run `task` against the active event loop, pumping it once.
    fn on_active_loop<R>(
        &mut self,
        task: impl FnOnce(&ActiveEventLoop) -> R,
    ) -> Result<R, NativeError> {
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| NativeError::new("platform is not initialized"))?;
        let mut pump = Pump {
            task: Some(task),
            output: None,
            events: &mut self.pending,
        };
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut pump)
        {
            self.exited = true;
            tracing::debug!("event loop exited with status {code}");
        }
        pump.output
            .ok_or_else(|| NativeError::new("event loop did not become active"))
    }

    fn pump(&mut self) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };
        let mut pump: Pump<'_, IdleTask, ()> = Pump {
            task: None,
            output: None,
            events: &mut self.pending,
        };
        if let PumpStatus::Exit(_) = event_loop.pump_app_events(Some(Duration::ZERO), &mut pump) {
            self.exited = true;
        }
    }
}

impl Platform for WinitPlatform {
    fn name(&self) -> &str {
        "winit"
    }

    fn host(&self) -> HostOs {
        HostOs::current()
    }

    fn init(&mut self) -> Result<(), NativeError> {
        if self.event_loop.is_some() {
            return Ok(());
        }
        let event_loop = match PARKED_LOOP.with(|slot| slot.borrow_mut().take()) {
            Some(event_loop) => event_loop,
            None => EventLoop::new().map_err(|e| NativeError(e.to_string()))?,
        };
        self.event_loop = Some(event_loop);
        self.exited = false;
        self.clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                tracing::warn!("clipboard unavailable: {e}");
                None
            }
        };
        Ok(())
    }

    fn quit(&mut self) {
        self.cursors.clear();
        self.surfaces.clear();
        self.pending.clear();
        self.clipboard = None;
        if let Some(event_loop) = self.event_loop.take() {
            PARKED_LOOP.with(|slot| *slot.borrow_mut() = Some(event_loop));
        }
    }

    fn set_gl_attributes(&mut self, attributes: GlAttributes) {
        if self.window.is_none() {
            self.attributes = attributes;
        }
    }

    fn desktop_size(&mut self) -> Result<Size, NativeError> {
        let size = self.on_active_loop(|event_loop| {
            event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .map(|monitor| monitor.size())
        })?;
        size.map(|s| Size::new(s.width, s.height))
            .ok_or_else(|| NativeError::new("no monitor attached"))
    }

    fn create_window(&mut self, request: &WindowRequest) -> Result<(), NativeError> {
        let title = request.title.clone();
        let size = request.size;
        let centered = request.centered;
        let window = self.on_active_loop(move |event_loop| {
            let mut attributes = Window::default_attributes()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(size.width, size.height))
                .with_resizable(false);
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next());
            if let (true, Some(monitor)) = (centered, monitor) {
                let origin = monitor.position();
                let area = monitor.size();
                attributes = attributes.with_position(PhysicalPosition::new(
                    origin.x + (area.width as i32 - size.width as i32) / 2,
                    origin.y + (area.height as i32 - size.height as i32) / 2,
                ));
            }
            event_loop.create_window(attributes)
        })?;
        self.window = Some(window.map_err(|e| NativeError(e.to_string()))?);
        Ok(())
    }

    fn destroy_window(&mut self) {
        self.gl = None;
        self.window = None;
    }

    fn set_window_grab(&mut self, grab: bool) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if !grab {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!("failed to release cursor grab: {e}");
            }
            return;
        }
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
        if let Err(e) = grabbed {
            tracing::warn!("failed to grab cursor: {e}");
        }
    }

    fn set_fullscreen(&mut self, mode: FullscreenMode) -> Result<(), NativeError> {
        let window = self.window()?;
        let monitor = window.current_monitor();
        let fullscreen = match (mode, monitor) {
            (FullscreenMode::Exclusive, Some(monitor)) => {
                let size = window.inner_size();
                let video_mode = monitor
                    .video_modes()
                    .filter(|m| m.size() == size)
                    .max_by_key(|m| (m.bit_depth(), m.refresh_rate_millihertz()));
                match video_mode {
                    Some(video_mode) => Fullscreen::Exclusive(video_mode),
                    None => {
                        tracing::warn!(
                            "no {}x{} video mode, falling back to borderless",
                            size.width,
                            size.height
                        );
                        Fullscreen::Borderless(Some(monitor))
                    }
                }
            }
            (FullscreenMode::Exclusive, None) => {
                return Err(NativeError::new("window is not on any monitor"));
            }
            (FullscreenMode::Desktop, monitor) => Fullscreen::Borderless(monitor),
        };
        window.set_fullscreen(Some(fullscreen));
        Ok(())
    }

    fn set_window_position(&mut self, position: IVec2) {
        if let Some(window) = self.window.as_ref() {
            window.set_outer_position(PhysicalPosition::new(position.x, position.y));
        }
    }

    fn set_minimize_on_focus_loss(&mut self, minimize: bool) {
        self.minimize_on_focus_loss = minimize;
    }

    fn create_context(&mut self) -> Result<(), NativeError> {
        let context = GlContext::create(self.window()?, self.attributes)?;
        self.gl = Some(context);
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), NativeError> {
        self.gl
            .as_mut()
            .ok_or_else(|| NativeError::new("no GL context"))?
            .make_current()
    }

    fn load_gl(&mut self) -> Result<Rc<dyn GlBackend>, NativeError> {
        let gl = self
            .gl
            .as_ref()
            .ok_or_else(|| NativeError::new("no GL context"))?
            .load()?;
        Ok(Rc::new(GlowBackend::new(gl)))
    }

    fn destroy_context(&mut self) {
        self.gl = None;
    }

    fn swap_buffers(&mut self) -> Result<(), NativeError> {
        if let Some(window) = self.window.as_ref() {
            window.pre_present_notify();
        }
        self.gl
            .as_ref()
            .ok_or_else(|| NativeError::new("no GL context"))?
            .swap_buffers()
    }

    fn create_surface(&mut self, size: Size, format: SurfaceFormat) -> Result<SurfaceId, NativeError> {
        if format != SurfaceFormat::ARGB8888 {
            return Err(NativeError::new("only 32-bit ARGB surfaces are supported"));
        }
        if size.width > u32::from(u16::MAX) || size.height > u32::from(u16::MAX) {
            return Err(NativeError(format!("surface {size} is too large")));
        }
        let id = SurfaceId(self.next_id());
        self.surfaces.insert(
            id,
            CursorSurface {
                size,
                bgra: vec![0; size.pixel_count() * format.bytes_per_pixel()],
            },
        );
        Ok(id)
    }

    fn write_surface_pixels(&mut self, surface: SurfaceId, pixels: &[u8]) -> Result<(), NativeError> {
        let target = self
            .surfaces
            .get_mut(&surface)
            .ok_or_else(|| NativeError::new("invalid surface"))?;
        if target.bgra.len() != pixels.len() {
            return Err(NativeError(format!(
                "surface holds {} bytes, got {}",
                target.bgra.len(),
                pixels.len()
            )));
        }
        target.bgra.copy_from_slice(pixels);
        Ok(())
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
    }

    fn create_color_cursor(&mut self, surface: SurfaceId, hotspot: IVec2) -> Result<CursorId, NativeError> {
        let image = self
            .surfaces
            .get(&surface)
            .ok_or_else(|| NativeError::new("invalid surface"))?;
        let rgba: Vec<u8> = image
            .bgra
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect();
        let (Ok(hx), Ok(hy)) = (u16::try_from(hotspot.x), u16::try_from(hotspot.y)) else {
            return Err(NativeError(format!("hotspot {hotspot} is out of range")));
        };
        let source = CustomCursor::from_rgba(
            rgba,
            image.size.width as u16,
            image.size.height as u16,
            hx,
            hy,
        )
        .map_err(|e| NativeError(e.to_string()))?;
        let cursor = self.on_active_loop(move |event_loop| event_loop.create_custom_cursor(source))?;
        let id = CursorId(self.next_id());
        self.cursors.insert(id, cursor);
        Ok(id)
    }

    fn free_cursor(&mut self, cursor: CursorId) {
        self.cursors.remove(&cursor);
    }

    fn show_cursor(&mut self, visible: bool) {
        if let Some(window) = self.window.as_ref() {
            window.set_cursor_visible(visible);
        }
    }

    fn set_cursor(&mut self, cursor: CursorId) {
        let (Some(window), Some(cursor)) = (self.window.as_ref(), self.cursors.get(&cursor)) else {
            return;
        };
        window.set_cursor(cursor.clone());
    }

    fn poll_events(&mut self, out: &mut Vec<NativeEvent>) {
        self.pump();
        for event in self.pending.drain(..) {
            match &event {
                WindowEvent::Resized(size) => {
                    if let Some(gl) = self.gl.as_ref() {
                        gl.resize(size.width, size.height);
                    }
                }
                WindowEvent::Focused(false) if self.minimize_on_focus_loss => {
                    // Only exclusive fullscreen gets out of the way.
                    let exclusive = self
                        .window
                        .as_ref()
                        .filter(|w| matches!(w.fullscreen(), Some(Fullscreen::Exclusive(_))));
                    if let Some(window) = exclusive {
                        window.set_minimized(true);
                    }
                }
                _ => {}
            }
            translate(event, out);
        }
        if std::mem::take(&mut self.exited) {
            out.push(NativeEvent::Quit);
        }
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.clipboard.as_mut()?.get_text().ok()
    }

    fn set_clipboard_text(&mut self, text: &str) -> bool {
        self.clipboard
            .as_mut()
            .is_some_and(|clipboard| clipboard.set_text(text.to_owned()).is_ok())
    }
}
