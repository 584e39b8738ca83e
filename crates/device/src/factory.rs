//! Resource constructors on the device.

use crate::device::GraphicsDevice;
use crate::error::DeviceError;
use crate::resources::{FrameBuffer, Shader, Texture, VertexBuffer, VertexLayout};
use glhal_common::{Image, Size};

impl GraphicsDevice {
    /// Create an empty texture. Upload pixels with [`Texture::set_data`].
    pub fn create_texture(&self) -> Result<Texture, DeviceError> {
        Ok(Texture::new(self.live()?.gl.clone())?)
    }

    pub fn create_texture_from_image(&self, image: &Image) -> Result<Texture, DeviceError> {
        let texture = self.create_texture()?;
        texture.set_data(image)?;
        Ok(texture)
    }

    /// Create a vertex buffer holding `capacity` vertices of `T`.
    pub fn create_vertex_buffer<T: VertexLayout>(
        &self,
        capacity: usize,
    ) -> Result<VertexBuffer<T>, DeviceError> {
        Ok(VertexBuffer::new(self.live()?.gl.clone(), capacity)?)
    }

    /// Create an off-screen target with a `size` color texture.
    pub fn create_frame_buffer(&self, size: Size) -> Result<FrameBuffer, DeviceError> {
        let state = self.live()?;
        Ok(FrameBuffer::new(
            state.gl.clone(),
            size,
            state.window_size.clone(),
        )?)
    }

    /// Compile one of the built-in shaders by name.
    pub fn create_shader(&self, name: &str) -> Result<Shader, DeviceError> {
        Ok(Shader::new(self.live()?.gl.clone(), name)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DeviceConfig;
    use crate::device::GraphicsDevice;
    use crate::error::{DeviceError, ResourceError};
    use crate::resources::{Bindable, Vertex};
    use glhal_common::{Image, Size};
    use glhal_native::FramebufferStatus;
    use glhal_native::testing::{FakePlatform, GlCall};

    fn device(platform: &FakePlatform) -> GraphicsDevice {
        let config = DeviceConfig {
            size: Size::new(320, 240),
            ..DeviceConfig::default()
        };
        GraphicsDevice::new(platform.clone(), &config).unwrap()
    }

    #[test]
    fn texture_from_image_uploads_pixels() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        let texture = device
            .create_texture_from_image(&Image::new(Size::new(4, 2)))
            .unwrap();
        assert_eq!(texture.size(), Size::new(4, 2));
        assert!(platform.gl().calls().contains(&GlCall::UploadTexture {
            texture: texture.id(),
            width: 4,
            height: 2,
            bytes: Some(32),
        }));
    }

    #[test]
    fn vertex_buffer_is_sized_in_vertices() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        let buffer = device.create_vertex_buffer::<Vertex>(6).unwrap();
        assert_eq!(buffer.capacity(), 6);
        assert!(platform.gl().calls().contains(&GlCall::AllocateVertexBuffer {
            buffer: buffer.id(),
            size: 6 * std::mem::size_of::<Vertex>(),
        }));
    }

    #[test]
    fn oversized_vertex_buffer_fails_cleanly() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        let err = device
            .create_vertex_buffer::<Vertex>(usize::MAX / 4)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DeviceError::Resource(ResourceError::Create { .. })
        ));
        let gl = platform.gl();
        let created = gl.count(|c| matches!(c, GlCall::CreateBuffer(_)));
        let deleted = gl.count(|c| matches!(c, GlCall::DeleteBuffer(_)));
        assert_eq!(created, deleted);
    }

    #[test]
    fn frame_buffer_unbind_restores_window_viewport() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        let target = device.create_frame_buffer(Size::new(64, 32)).unwrap();
        let gl = platform.gl();

        target.bind().unwrap();
        target.unbind().unwrap();
        let viewports: Vec<_> = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GlCall::Viewport { .. }))
            .collect();
        assert_eq!(
            viewports,
            vec![
                GlCall::Viewport {
                    x: 0,
                    y: 0,
                    width: 64,
                    height: 32
                },
                GlCall::Viewport {
                    x: 0,
                    y: 0,
                    width: 320,
                    height: 240
                },
            ]
        );
    }

    #[test]
    fn incomplete_frame_buffer_is_reported() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        platform
            .gl()
            .set_framebuffer_status(FramebufferStatus::Incomplete(0x8CD6));
        let err = device.create_frame_buffer(Size::new(8, 8)).err().unwrap();
        assert!(matches!(
            err,
            DeviceError::Resource(ResourceError::IncompleteFrameBuffer { status: 0x8CD6 })
        ));
    }

    #[test]
    fn unknown_shader_is_rejected() {
        let platform = FakePlatform::new();
        let device = device(&platform);
        let err = device.create_shader("sepia").err().unwrap();
        assert_eq!(err.to_string(), "no built-in shader named \"sepia\"");
        assert!(device.create_shader("texture").is_ok());
    }

    #[test]
    fn resources_outliving_the_device_skip_native_deletes() {
        let platform = FakePlatform::new();
        let mut device = device(&platform);
        let texture = device.create_texture().unwrap();
        device.dispose().unwrap();

        let gl = platform.gl();
        gl.take_calls();
        drop(texture);
        assert!(gl.calls().is_empty());
    }
}
