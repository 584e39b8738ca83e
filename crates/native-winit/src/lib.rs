//! Desktop backend for the glhal native seam.
//!
//! [`WinitPlatform`] drives a winit event loop by pumping it, so window and
//! cursor creation behave like the synchronous calls of an SDL-style API.
//! glutin provides the context and [`GlowBackend`] the GL entry points.

mod context;
mod events;
mod gl;
mod platform;

pub use gl::GlowBackend;
pub use platform::WinitPlatform;
