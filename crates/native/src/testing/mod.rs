//! In-memory stand-ins for a real windowing library and GL driver.

mod fake_gl;
mod fake_platform;

pub use fake_gl::{FakeGl, GlCall};
pub use fake_platform::{FakeCursor, FakePlatform, FakePlatformState, FakeSurface, FakeWindow};
