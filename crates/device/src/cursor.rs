//! Hardware cursors built from ARGB pixel data.

use crate::deferred::DeferredQueue;
use crate::error::DeviceError;
use glam::IVec2;
use glhal_common::Size;
use glhal_native::{CursorId, NativeError, Platform, SurfaceFormat, SurfaceId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Native cursor creation is retried this many times before giving up.
pub const CREATE_ATTEMPTS: u32 = 3;

/// Native handles behind a cursor. The surface only lives while the cursor
/// is being built, or until a failed build is cleaned up.
#[derive(Debug, Default)]
struct CursorHandles {
    cursor: Option<CursorId>,
    surface: Option<SurfaceId>,
}

impl CursorHandles {
    fn release(&mut self, platform: &mut dyn Platform) {
        if let Some(cursor) = self.cursor.take() {
            platform.free_cursor(cursor);
        }
        if let Some(surface) = self.surface.take() {
            platform.free_surface(surface);
        }
    }
}

/// Native hardware cursor.
///
/// May be moved to and dropped on any thread. Its native handles are
/// released on the device's owning thread at the next
/// [`crate::GraphicsDevice::end_frame`] after [`HardwareCursor::dispose`]
/// or drop, whichever comes first.
pub struct HardwareCursor {
    name: String,
    handles: Arc<Mutex<CursorHandles>>,
    queue: DeferredQueue,
}

impl fmt::Debug for HardwareCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareCursor")
            .field("name", &self.name)
            .field("handles", &*self.handles.lock())
            .finish()
    }
}

impl HardwareCursor {
    /// Build a cursor from `size` ARGB pixels, one little-endian `u32` per
    /// pixel (bytes B, G, R, A).
    pub(crate) fn create(
        platform: &mut dyn Platform,
        queue: DeferredQueue,
        name: &str,
        size: Size,
        pixels: &[u8],
        hotspot: IVec2,
    ) -> Result<Self, DeviceError> {
        let fail = |message: String| DeviceError::CursorCreation {
            name: name.to_owned(),
            message,
        };

        let format = SurfaceFormat::ARGB8888;
        let expected = size.pixel_count() * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(fail(format!(
                "{size} cursor needs {expected} bytes of pixel data, got {}",
                pixels.len()
            )));
        }

        let surface = platform
            .create_surface(size, format)
            .map_err(|e| fail(e.0))?;
        let mut handles = CursorHandles {
            cursor: None,
            surface: Some(surface),
        };
        if let Err(e) = platform.write_surface_pixels(surface, pixels) {
            handles.release(platform);
            return Err(fail(e.0));
        }

        let mut last_error = NativeError::new("no attempt made");
        for attempt in 1..=CREATE_ATTEMPTS {
            match platform.create_color_cursor(surface, hotspot) {
                Ok(cursor) => {
                    handles.cursor = Some(cursor);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to create hardware cursor {name} (attempt {attempt}/{CREATE_ATTEMPTS}): {e}"
                    );
                    last_error = e;
                }
            }
        }
        if handles.cursor.is_none() {
            handles.release(platform);
            return Err(fail(last_error.0));
        }

        if let Some(surface) = handles.surface.take() {
            platform.free_surface(surface);
        }
        tracing::debug!("created hardware cursor {name} ({size})");
        Ok(Self {
            name: name.to_owned(),
            handles: Arc::new(Mutex::new(handles)),
            queue,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native cursor, `None` once released.
    pub fn cursor_id(&self) -> Option<CursorId> {
        self.handles.lock().cursor
    }

    pub fn is_released(&self) -> bool {
        self.cursor_id().is_none()
    }

    /// Schedule release of the native handles. Calling it again, or
    /// dropping the cursor afterward, is harmless.
    pub fn dispose(&self) {
        self.schedule_release();
    }

    fn schedule_release(&self) {
        let handles = Arc::clone(&self.handles);
        let scheduled = self
            .queue
            .schedule(move |platform| handles.lock().release(platform));
        if !scheduled {
            tracing::debug!("device gone; hardware cursor {} not released", self.name);
        }
    }
}

impl Drop for HardwareCursor {
    fn drop(&mut self) {
        self.schedule_release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred;
    use glhal_native::testing::FakePlatform;

    const SIZE: Size = Size::new(2, 2);

    fn pixels() -> Vec<u8> {
        (0..16).collect()
    }

    #[test]
    fn surface_is_freed_once_cursor_exists() {
        let mut platform = FakePlatform::new();
        let (queue, _actions) = deferred::channel();
        let cursor = HardwareCursor::create(
            &mut platform,
            queue,
            "arrow",
            SIZE,
            &pixels(),
            IVec2::new(1, 0),
        )
        .unwrap();

        let state = platform.state();
        assert!(state.surfaces.is_empty());
        assert_eq!(state.count("free_surface"), 1);
        let id = cursor.cursor_id().unwrap();
        assert_eq!(state.cursors[&id].pixels, pixels());
        assert_eq!(state.cursors[&id].hotspot, IVec2::new(1, 0));
    }

    #[test]
    fn retries_before_succeeding() {
        let mut platform = FakePlatform::new();
        platform.state_mut().cursor_failures = 2;
        let (queue, _actions) = deferred::channel();
        let cursor =
            HardwareCursor::create(&mut platform, queue, "hand", SIZE, &pixels(), IVec2::ZERO);
        assert!(cursor.is_ok());
        let state = platform.state();
        assert_eq!(state.cursor_attempts, 3);
        assert!(state.surfaces.is_empty());
        assert_eq!(state.count("free_surface"), 1);
        assert_eq!(state.cursors.len(), 1);
    }

    #[test]
    fn gives_up_after_three_attempts_and_frees_surface() {
        let mut platform = FakePlatform::new();
        platform.state_mut().cursor_failures = 5;
        let (queue, _actions) = deferred::channel();
        let err = HardwareCursor::create(&mut platform, queue, "hand", SIZE, &pixels(), IVec2::ZERO)
            .unwrap_err();
        match err {
            DeviceError::CursorCreation { name, message } => {
                assert_eq!(name, "hand");
                assert_eq!(message, "cursor creation failed");
            }
            other => panic!("unexpected error {other}"),
        }
        let state = platform.state();
        assert_eq!(state.cursor_attempts, CREATE_ATTEMPTS);
        assert!(state.surfaces.is_empty());
        assert!(state.cursors.is_empty());
    }

    #[test]
    fn short_pixel_buffer_is_a_creation_error() {
        let mut platform = FakePlatform::new();
        let (queue, _actions) = deferred::channel();
        let err = HardwareCursor::create(&mut platform, queue, "tiny", SIZE, &[0; 3], IVec2::ZERO)
            .unwrap_err();
        assert!(matches!(err, DeviceError::CursorCreation { .. }));
        assert_eq!(platform.state().count("create_surface"), 0);
    }

    #[test]
    fn dispose_and_drop_release_exactly_once() {
        let mut platform = FakePlatform::new();
        let (queue, actions) = deferred::channel();
        let cursor = HardwareCursor::create(
            &mut platform,
            queue.clone(),
            "arrow",
            SIZE,
            &pixels(),
            IVec2::ZERO,
        )
        .unwrap();

        cursor.dispose();
        assert!(!cursor.is_released());
        let handles = Arc::clone(&cursor.handles);
        std::thread::spawn(move || drop(cursor)).join().unwrap();
        assert_eq!(queue.pending(), 2);

        assert_eq!(actions.drain(&mut platform), 2);
        assert_eq!(platform.state().count("free_cursor"), 1);
        let handles = handles.lock();
        assert!(handles.cursor.is_none());
        assert!(handles.surface.is_none());
    }
}
