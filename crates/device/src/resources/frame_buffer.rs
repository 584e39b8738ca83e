use super::{Bindable, Texture, check, extent};
use crate::error::ResourceError;
use glhal_common::Size;
use glhal_native::{FramebufferId, FramebufferStatus, GlBackend};
use std::cell::Cell;
use std::rc::Rc;

/// Off-screen render target with a single color texture.
pub struct FrameBuffer {
    gl: Rc<dyn GlBackend>,
    id: FramebufferId,
    size: Size,
    texture: Texture,
    window_size: Rc<Cell<Size>>,
}

impl FrameBuffer {
    pub(crate) fn new(
        gl: Rc<dyn GlBackend>,
        size: Size,
        window_size: Rc<Cell<Size>>,
    ) -> Result<Self, ResourceError> {
        let texture = Texture::new(gl.clone())?;
        texture.allocate(size)?;
        let id = gl.create_framebuffer().map_err(|e| ResourceError::Create {
            kind: "frame buffer",
            message: e.0,
        })?;
        let framebuffer = Self {
            gl,
            id,
            size,
            texture,
            window_size,
        };

        let gl = framebuffer.gl.as_ref();
        gl.attach_color_texture(id, framebuffer.texture.id());
        check(gl, "glFramebufferTexture2D")?;
        if let FramebufferStatus::Incomplete(status) = gl.framebuffer_status(id) {
            tracing::error!(target: "graphics", "frame buffer {size} is incomplete: 0x{status:04X}");
            return Err(ResourceError::IncompleteFrameBuffer { status });
        }
        gl.bind_framebuffer(None);
        check(gl, "glBindFramebuffer")?;
        tracing::debug!("created frame buffer {} ({size})", id.get());
        Ok(framebuffer)
    }

    pub fn id(&self) -> FramebufferId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Color attachment, valid for sampling once unbound.
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Redirect drawing back to the window and restore its viewport.
    pub fn unbind(&self) -> Result<(), ResourceError> {
        let gl = self.gl.as_ref();
        gl.bind_framebuffer(None);
        check(gl, "glBindFramebuffer")?;
        let (width, height) = extent(self.window_size.get());
        gl.viewport(0, 0, width, height);
        check(gl, "glViewport")
    }
}

impl Bindable for FrameBuffer {
    /// Redirect drawing into this buffer with a viewport covering it.
    fn bind(&self) -> Result<(), ResourceError> {
        let gl = self.gl.as_ref();
        gl.bind_framebuffer(Some(self.id));
        check(gl, "glBindFramebuffer")?;
        let (width, height) = extent(self.size);
        gl.viewport(0, 0, width, height);
        check(gl, "glViewport")
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if self.gl.is_alive() {
            self.gl.delete_framebuffer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_native::testing::{FakeGl, GlCall};

    fn window(size: Size) -> Rc<Cell<Size>> {
        Rc::new(Cell::new(size))
    }

    #[test]
    fn bind_and_unbind_swap_viewports() {
        let gl = Rc::new(FakeGl::new());
        let window_size = window(Size::new(800, 600));
        let fb = FrameBuffer::new(gl.clone(), Size::new(64, 32), window_size.clone()).unwrap();
        gl.take_calls();

        fb.bind().unwrap();
        window_size.set(Size::new(1024, 768));
        fb.unbind().unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::BindFramebuffer(Some(fb.id())),
                GlCall::Viewport {
                    x: 0,
                    y: 0,
                    width: 64,
                    height: 32
                },
                GlCall::BindFramebuffer(None),
                GlCall::Viewport {
                    x: 0,
                    y: 0,
                    width: 1024,
                    height: 768
                },
            ]
        );
    }

    #[test]
    fn incomplete_buffer_fails_and_cleans_up() {
        let gl = Rc::new(FakeGl::new());
        gl.set_framebuffer_status(FramebufferStatus::Incomplete(0x8CD6));
        let err = FrameBuffer::new(gl.clone(), Size::new(8, 8), window(Size::new(8, 8)))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ResourceError::IncompleteFrameBuffer { status: 0x8CD6 }
        ));
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteFramebuffer(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
    }

    #[test]
    fn color_texture_matches_buffer_size() {
        let gl = Rc::new(FakeGl::new());
        let fb = FrameBuffer::new(gl, Size::new(16, 16), window(Size::new(8, 8))).unwrap();
        assert_eq!(fb.texture().size(), Size::new(16, 16));
    }
}
