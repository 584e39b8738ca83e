use super::fake_gl::FakeGl;
use crate::error::NativeError;
use crate::event::NativeEvent;
use crate::gl::GlBackend;
use crate::platform::{
    CursorId, FullscreenMode, GlAttributes, Platform, SurfaceFormat, SurfaceId, WindowRequest,
};
use glam::IVec2;
use glhal_common::{HostOs, Size};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroU32;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeWindow {
    pub request: WindowRequest,
    pub grabbed: bool,
    pub fullscreen: Option<FullscreenMode>,
    pub position: Option<IVec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeSurface {
    pub size: Size,
    pub format: SurfaceFormat,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeCursor {
    pub surface: SurfaceId,
    pub hotspot: IVec2,
    pub pixels: Vec<u8>,
}

/// Scripted inputs and observable outputs of a [`FakePlatform`].
#[derive(Debug)]
pub struct FakePlatformState {
    pub host: HostOs,
    pub desktop_size: Size,

    pub fail_init: Option<String>,
    pub fail_window: Option<String>,
    pub fail_context: Option<String>,
    pub fail_make_current: Option<String>,
    pub fail_surface: Option<String>,
    /// Number of upcoming cursor creations that fail.
    pub cursor_failures: u32,

    /// Every platform call in order, by name.
    pub log: Vec<&'static str>,
    pub initialized: bool,
    pub attributes: Option<GlAttributes>,
    pub window: Option<FakeWindow>,
    pub context: bool,
    pub current: bool,
    pub minimize_on_focus_loss: bool,
    pub swaps: u32,
    pub surfaces: BTreeMap<SurfaceId, FakeSurface>,
    pub cursors: BTreeMap<CursorId, FakeCursor>,
    pub cursor_attempts: u32,
    pub cursor_visible: bool,
    pub active_cursor: Option<CursorId>,
    pub events: VecDeque<NativeEvent>,
    pub clipboard: Option<String>,
    next_id: u32,
}

impl Default for FakePlatformState {
    fn default() -> Self {
        Self {
            host: HostOs::Linux,
            desktop_size: Size::new(1920, 1080),
            fail_init: None,
            fail_window: None,
            fail_context: None,
            fail_make_current: None,
            fail_surface: None,
            cursor_failures: 0,
            log: Vec::new(),
            initialized: false,
            attributes: None,
            window: None,
            context: false,
            current: false,
            minimize_on_focus_loss: true,
            swaps: 0,
            surfaces: BTreeMap::new(),
            cursors: BTreeMap::new(),
            cursor_attempts: 0,
            cursor_visible: true,
            active_cursor: None,
            events: VecDeque::new(),
            clipboard: None,
            next_id: 0,
        }
    }
}

impl FakePlatformState {
    pub fn count(&self, call: &str) -> usize {
        self.log.iter().filter(|c| **c == call).count()
    }

    fn next_id(&mut self) -> NonZeroU32 {
        let id = NonZeroU32::MIN.saturating_add(self.next_id);
        self.next_id = id.get();
        id
    }
}

/// In-memory platform. Clones share state, so a test keeps one clone to
/// script failures and inspect results after handing the other to a device.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Rc<RefCell<FakePlatformState>>,
    gl: Rc<FakeGl>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, FakePlatformState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakePlatformState> {
        self.state.borrow_mut()
    }

    /// The GL backend handed out by `load_gl`.
    pub fn gl(&self) -> Rc<FakeGl> {
        self.gl.clone()
    }

    pub fn push_event(&self, event: NativeEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    fn logged(&self, call: &'static str) -> RefMut<'_, FakePlatformState> {
        let mut state = self.state.borrow_mut();
        state.log.push(call);
        state
    }
}

impl Platform for FakePlatform {
    fn name(&self) -> &str {
        "fake"
    }

    fn host(&self) -> HostOs {
        self.state.borrow().host
    }

    fn init(&mut self) -> Result<(), NativeError> {
        let mut state = self.logged("init");
        if let Some(message) = state.fail_init.take() {
            return Err(NativeError(message));
        }
        state.initialized = true;
        Ok(())
    }

    fn quit(&mut self) {
        self.logged("quit").initialized = false;
    }

    fn set_gl_attributes(&mut self, attributes: GlAttributes) {
        let mut state = self.logged("set_gl_attributes");
        if state.window.is_none() {
            state.attributes = Some(attributes);
        }
    }

    fn desktop_size(&mut self) -> Result<Size, NativeError> {
        Ok(self.logged("desktop_size").desktop_size)
    }

    fn create_window(&mut self, request: &WindowRequest) -> Result<(), NativeError> {
        let mut state = self.logged("create_window");
        if let Some(message) = state.fail_window.take() {
            return Err(NativeError(message));
        }
        state.window = Some(FakeWindow {
            request: request.clone(),
            grabbed: false,
            fullscreen: None,
            position: None,
        });
        Ok(())
    }

    fn destroy_window(&mut self) {
        self.logged("destroy_window").window = None;
    }

    fn set_window_grab(&mut self, grab: bool) {
        if let Some(window) = self.logged("set_window_grab").window.as_mut() {
            window.grabbed = grab;
        }
    }

    fn set_fullscreen(&mut self, mode: FullscreenMode) -> Result<(), NativeError> {
        match self.logged("set_fullscreen").window.as_mut() {
            Some(window) => {
                window.fullscreen = Some(mode);
                Ok(())
            }
            None => Err(NativeError::new("no window")),
        }
    }

    fn set_window_position(&mut self, position: IVec2) {
        if let Some(window) = self.logged("set_window_position").window.as_mut() {
            window.position = Some(position);
        }
    }

    fn set_minimize_on_focus_loss(&mut self, minimize: bool) {
        self.logged("set_minimize_on_focus_loss").minimize_on_focus_loss = minimize;
    }

    fn create_context(&mut self) -> Result<(), NativeError> {
        let mut state = self.logged("create_context");
        if let Some(message) = state.fail_context.take() {
            return Err(NativeError(message));
        }
        state.context = true;
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), NativeError> {
        let mut state = self.logged("make_current");
        if let Some(message) = state.fail_make_current.take() {
            return Err(NativeError(message));
        }
        state.current = state.context;
        Ok(())
    }

    fn load_gl(&mut self) -> Result<Rc<dyn GlBackend>, NativeError> {
        self.logged("load_gl");
        Ok(self.gl.clone())
    }

    fn destroy_context(&mut self) {
        let mut state = self.logged("destroy_context");
        state.context = false;
        state.current = false;
    }

    fn swap_buffers(&mut self) -> Result<(), NativeError> {
        self.logged("swap_buffers").swaps += 1;
        Ok(())
    }

    fn create_surface(&mut self, size: Size, format: SurfaceFormat) -> Result<SurfaceId, NativeError> {
        let mut state = self.logged("create_surface");
        if let Some(message) = state.fail_surface.take() {
            return Err(NativeError(message));
        }
        let id = SurfaceId(state.next_id());
        let pixels = vec![0; size.pixel_count() * format.bytes_per_pixel()];
        state.surfaces.insert(
            id,
            FakeSurface {
                size,
                format,
                pixels,
            },
        );
        Ok(id)
    }

    fn write_surface_pixels(&mut self, surface: SurfaceId, pixels: &[u8]) -> Result<(), NativeError> {
        let mut state = self.logged("write_surface_pixels");
        let Some(target) = state.surfaces.get_mut(&surface) else {
            return Err(NativeError::new("invalid surface"));
        };
        if target.pixels.len() != pixels.len() {
            return Err(NativeError(format!(
                "surface holds {} bytes, got {}",
                target.pixels.len(),
                pixels.len()
            )));
        }
        target.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        self.logged("free_surface").surfaces.remove(&surface);
    }

    fn create_color_cursor(&mut self, surface: SurfaceId, hotspot: IVec2) -> Result<CursorId, NativeError> {
        let mut state = self.logged("create_color_cursor");
        state.cursor_attempts += 1;
        if state.cursor_failures > 0 {
            state.cursor_failures -= 1;
            return Err(NativeError::new("cursor creation failed"));
        }
        let Some(pixels) = state.surfaces.get(&surface).map(|s| s.pixels.clone()) else {
            return Err(NativeError::new("invalid surface"));
        };
        let id = CursorId(state.next_id());
        state.cursors.insert(
            id,
            FakeCursor {
                surface,
                hotspot,
                pixels,
            },
        );
        Ok(id)
    }

    fn free_cursor(&mut self, cursor: CursorId) {
        let mut state = self.logged("free_cursor");
        state.cursors.remove(&cursor);
        if state.active_cursor == Some(cursor) {
            state.active_cursor = None;
        }
    }

    fn show_cursor(&mut self, visible: bool) {
        self.logged("show_cursor").cursor_visible = visible;
    }

    fn set_cursor(&mut self, cursor: CursorId) {
        self.logged("set_cursor").active_cursor = Some(cursor);
    }

    fn poll_events(&mut self, out: &mut Vec<NativeEvent>) {
        out.extend(self.logged("poll_events").events.drain(..));
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.logged("clipboard_text").clipboard.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) -> bool {
        self.logged("set_clipboard_text").clipboard = Some(text.to_owned());
        true
    }
}
