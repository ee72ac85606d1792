//! Pixel buffers for the progressive renderer.

use crate::renderer::{color_to_rgba, Color};

/// Pixels in a `width` x `height` image, widened before multiplying.
#[inline]
pub(crate) fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Row-major index of pixel (x, y).
#[inline]
pub(crate) fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Row-major RGB float buffer, 3 floats per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FrameBuffer {
    /// Create a new buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; pixel_count(width, height) * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of floats in one row.
    pub fn row_len(&self) -> usize {
        self.width as usize * 3
    }

    /// Offset of the red channel of pixel (x, y).
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        pixel_offset(self.width, x, y) * 3
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y);
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.data[i] = color.x;
        self.data[i + 1] = color.y;
        self.data[i + 2] = color.z;
    }

    /// Zero every channel.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(pixel_count(self.width, self.height) * 4);
        for px in self.data.chunks_exact(3) {
            bytes.extend_from_slice(&color_to_rgba(Color::new(px[0], px[1], px[2])));
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_row_major() {
        let mut buffer = FrameBuffer::new(4, 3);
        buffer.set(1, 2, Color::new(0.1, 0.2, 0.3));

        assert_eq!(buffer.get(1, 2), Color::new(0.1, 0.2, 0.3));
        assert_eq!(buffer.index(1, 2), (2 * 4 + 1) * 3);
        assert_eq!(buffer.as_slice()[buffer.index(1, 2) + 2], 0.3);
        assert_eq!(buffer.row_len(), 12);
    }

    #[test]
    fn test_offsets_do_not_wrap_at_large_resolutions() {
        // 40000 x 40000 x 3 is past u32::MAX
        assert_eq!(pixel_count(40_000, 40_000) * 3, 4_800_000_000);
        assert_eq!(pixel_offset(40_000, 39_999, 39_999) * 3, 4_799_999_997);
    }

    #[test]
    fn test_clear() {
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.set(0, 0, Color::ONE);
        buffer.clear();
        assert!(buffer.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_to_rgba8() {
        let mut buffer = FrameBuffer::new(2, 1);
        buffer.set(1, 0, Color::new(1.0, 0.0, 0.5));
        assert_eq!(buffer.to_rgba8(), vec![0, 0, 0, 255, 255, 0, 127, 255]);
    }
}
