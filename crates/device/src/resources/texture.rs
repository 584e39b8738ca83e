use super::{Bindable, check, extent};
use crate::error::ResourceError;
use glhal_common::{Image, Size};
use glhal_native::{GlBackend, TextureId};
use std::cell::Cell;
use std::rc::Rc;

/// 2D BGRA texture.
pub struct Texture {
    gl: Rc<dyn GlBackend>,
    id: TextureId,
    size: Cell<Size>,
}

impl Texture {
    pub(crate) fn new(gl: Rc<dyn GlBackend>) -> Result<Self, ResourceError> {
        let id = gl.create_texture().map_err(|e| ResourceError::Create {
            kind: "texture",
            message: e.0,
        })?;
        tracing::debug!("created texture {}", id.get());
        Ok(Self {
            gl,
            id,
            size: Cell::new(Size::ZERO),
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size.get()
    }

    /// Replace the contents with `image`, resizing to match.
    pub fn set_data(&self, image: &Image) -> Result<(), ResourceError> {
        self.upload(image.size(), Some(image.data()))
    }

    /// Replace the contents with tightly packed BGRA rows, top row first.
    pub fn set_bgra(&self, size: Size, data: &[u8]) -> Result<(), ResourceError> {
        let expected = size.pixel_count() * 4;
        if data.len() != expected {
            return Err(ResourceError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.upload(size, Some(data))
    }

    /// Allocate uninitialized storage of `size`.
    pub fn allocate(&self, size: Size) -> Result<(), ResourceError> {
        self.upload(size, None)
    }

    fn upload(&self, size: Size, data: Option<&[u8]>) -> Result<(), ResourceError> {
        let (width, height) = extent(size);
        self.gl.upload_texture_bgra(self.id, width, height, data);
        check(self.gl.as_ref(), "glTexImage2D")?;
        self.size.set(size);
        Ok(())
    }
}

impl Bindable for Texture {
    fn bind(&self) -> Result<(), ResourceError> {
        self.gl.bind_texture(0, Some(self.id));
        check(self.gl.as_ref(), "glBindTexture")
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.gl.is_alive() {
            self.gl.delete_texture(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_native::testing::{FakeGl, GlCall};

    #[test]
    fn set_data_uploads_whole_image() {
        let gl = Rc::new(FakeGl::new());
        let texture = Texture::new(gl.clone()).unwrap();
        texture.set_data(&Image::new(Size::new(4, 2))).unwrap();
        assert_eq!(texture.size(), Size::new(4, 2));
        assert!(gl.calls().contains(&GlCall::UploadTexture {
            texture: texture.id(),
            width: 4,
            height: 2,
            bytes: Some(32),
        }));
    }

    #[test]
    fn wrong_length_is_rejected_before_upload() {
        let gl = Rc::new(FakeGl::new());
        let texture = Texture::new(gl.clone()).unwrap();
        let err = texture.set_bgra(Size::new(2, 2), &[0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::SizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
        assert_eq!(gl.count(|c| matches!(c, GlCall::UploadTexture { .. })), 0);
    }

    #[test]
    fn drop_deletes_only_while_alive() {
        let gl = Rc::new(FakeGl::new());
        let id = {
            let texture = Texture::new(gl.clone()).unwrap();
            texture.id()
        };
        assert!(gl.calls().contains(&GlCall::DeleteTexture(id)));

        let texture = Texture::new(gl.clone()).unwrap();
        let id = texture.id();
        gl.mark_lost();
        drop(texture);
        assert!(!gl.calls().contains(&GlCall::DeleteTexture(id)));
    }

    #[test]
    fn create_failure_carries_native_message() {
        let gl = Rc::new(FakeGl::new());
        gl.fail_next_create("out of names");
        let err = Texture::new(gl).err().unwrap();
        assert_eq!(err.to_string(), "failed to create texture: out of names");
    }
}
