use crate::types::Size;

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("pixel buffer holds {actual} bytes, {expected} needed for a {size} image")]
    SizeMismatch {
        size: Size,
        expected: usize,
        actual: usize,
    },
}

/// CPU-side 32-bit image, pixels stored as B, G, R, A bytes.
///
/// Rows are `stride` bytes apart, first row on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    size: Size,
    stride: usize,
    data: Vec<u8>,
}

impl Image {
    /// Zero-filled image with tightly packed rows.
    pub fn new(size: Size) -> Self {
        let stride = size.width as usize * BYTES_PER_PIXEL;
        Self {
            size,
            stride,
            data: vec![0; stride * size.height as usize],
        }
    }

    /// Wrap tightly packed BGRA data.
    pub fn from_bgra(size: Size, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = size.pixel_count() * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                size,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            stride: size.width as usize * BYTES_PER_PIXEL,
            data,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// BGRA bytes of the pixel at (x, y), or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let at = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[at..at + BYTES_PER_PIXEL]);
        Some(px)
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(self.stride.max(1))
            .flat_map(|row| row[..self.size.width as usize * BYTES_PER_PIXEL].chunks_exact(4))
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Reverse the row order in place.
    pub fn flip_vertical(&mut self) {
        let rows = self.size.height as usize;
        if self.stride == 0 || rows < 2 {
            return;
        }
        let (mut top, mut bottom) = (0, rows - 1);
        while top < bottom {
            let (head, tail) = self.data.split_at_mut(bottom * self.stride);
            head[top * self.stride..(top + 1) * self.stride]
                .swap_with_slice(&mut tail[..self.stride]);
            top += 1;
            bottom -= 1;
        }
    }

    /// Tightly packed R, G, B, A copy, the layout most encoders expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels()
            .flat_map(|[b, g, r, a]| [r, g, b, a])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(size: Size) -> Image {
        let mut data = Vec::new();
        for y in 0..size.height {
            for _ in 0..size.width {
                data.extend_from_slice(&[y as u8, 0, 0, 255]);
            }
        }
        Image::from_bgra(size, data).unwrap()
    }

    #[test]
    fn new_image_is_zeroed_and_packed() {
        let img = Image::new(Size::new(3, 2));
        assert_eq!(img.stride(), 12);
        assert_eq!(img.data().len(), 24);
        assert!(img.pixels().all(|p| p == [0, 0, 0, 0]));
    }

    #[test]
    fn from_bgra_rejects_short_buffers() {
        let err = Image::from_bgra(Size::new(2, 2), vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::SizeMismatch {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn flip_reverses_rows() {
        let mut img = striped(Size::new(2, 3));
        img.flip_vertical();
        assert_eq!(img.pixel(0, 0), Some([2, 0, 0, 255]));
        assert_eq!(img.pixel(1, 1), Some([1, 0, 0, 255]));
        assert_eq!(img.pixel(0, 2), Some([0, 0, 0, 255]));
    }

    #[test]
    fn flip_even_row_count() {
        let mut img = striped(Size::new(1, 4));
        img.flip_vertical();
        let firsts: Vec<u8> = img.pixels().map(|p| p[0]).collect();
        assert_eq!(firsts, vec![3, 2, 1, 0]);
    }

    #[test]
    fn rgba_conversion_swaps_red_and_blue() {
        let img = Image::from_bgra(Size::new(1, 1), vec![10, 20, 30, 40]).unwrap();
        assert_eq!(img.to_rgba(), vec![30, 20, 10, 40]);
    }

    #[test]
    fn pixel_out_of_bounds() {
        let img = Image::new(Size::new(2, 2));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 2), None);
    }
}
