use crate::error::DeviceError;
use crate::render_state::check;
use crate::resources::extent;
use glhal_common::{Image, Size};
use glhal_native::{GlBackend, PackState};

/// Restores the pack state captured at construction, on every exit path.
struct PackStateGuard<'a> {
    gl: &'a dyn GlBackend,
    saved: PackState,
}

impl<'a> PackStateGuard<'a> {
    fn save(gl: &'a dyn GlBackend) -> Self {
        Self {
            gl,
            saved: gl.pack_state(),
        }
    }
}

impl Drop for PackStateGuard<'_> {
    fn drop(&mut self) {
        self.gl.set_pack_state(self.saved);
    }
}

/// Synchronously read the window framebuffer into a top-down BGRA image.
pub(crate) fn capture(gl: &dyn GlBackend, size: Size) -> Result<Image, DeviceError> {
    let mut image = Image::new(size);
    if size.is_empty() {
        return Ok(image);
    }

    let (width, height) = extent(size);
    {
        let _restore = PackStateGuard::save(gl);
        gl.set_pack_state(PackState {
            row_length: width,
            alignment: 1,
        });
        check(gl, "glPixelStorei")?;

        gl.read_pixels_bgra(0, 0, width, height, image.data_mut());
        check(gl, "glReadPixels")?;
        gl.finish();
        check(gl, "glFinish")?;
    }

    // GL rows run bottom-up.
    image.flip_vertical();
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_native::testing::{FakeGl, GlCall};

    #[test]
    fn black_frame_reads_back_opaque_black() {
        let gl = FakeGl::new();
        gl.clear_color(0.0, 0.0, 0.0, 1.0);
        gl.clear(glhal_native::ClearBuffers::Color);
        let image = capture(&gl, Size::new(3, 2)).unwrap();
        assert_eq!(image.size(), Size::new(3, 2));
        assert!(image.pixels().all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn rows_come_out_top_down() {
        let gl = FakeGl::new();
        let bottom = [255, 0, 0, 255];
        let top = [0, 0, 255, 255];
        gl.set_framebuffer_pixels([bottom, bottom, top, top].concat());
        let image = capture(&gl, Size::new(2, 2)).unwrap();
        assert_eq!(image.pixel(0, 0), Some(top));
        assert_eq!(image.pixel(1, 1), Some(bottom));
    }

    #[test]
    fn pack_state_is_set_then_restored() {
        let gl = FakeGl::new();
        capture(&gl, Size::new(5, 1)).unwrap();
        let packs: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::SetPackState(state) => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(
            packs,
            vec![
                PackState {
                    row_length: 5,
                    alignment: 1
                },
                PackState::default(),
            ]
        );
        assert!(gl.calls().contains(&GlCall::Finish));
    }

    #[test]
    fn pack_state_is_restored_on_error() {
        let gl = FakeGl::new();
        gl.push_error(0x0502);
        assert!(capture(&gl, Size::new(1, 1)).is_err());
        assert_eq!(gl.pack_state(), PackState::default());
    }

    #[test]
    fn empty_window_gives_empty_image() {
        let gl = FakeGl::new();
        let image = capture(&gl, Size::new(0, 10)).unwrap();
        assert!(image.data().is_empty());
        assert!(gl.calls().is_empty());
    }
}
