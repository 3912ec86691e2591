//! RGBA8 pixel buffer shared by every pipeline stage.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("Buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Flat row-major RGBA samples, four bytes per pixel.
///
/// Construction checks that the data length agrees with the declared
/// dimensions and that the image is not empty, so every stage can divide by
/// the pixel count without guarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, BufferError> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgba.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Iterate pixels as `[r, g, b, a]` slices.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(4)
    }

    pub(crate) fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.data.chunks_exact_mut(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_length() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            BufferError::LengthMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn new_rejects_empty() {
        assert!(matches!(
            PixelBuffer::new(0, 10, Vec::new()),
            Err(BufferError::Empty { .. })
        ));
    }

    #[test]
    fn filled_repeats_pixel() {
        let buf = PixelBuffer::filled(3, 2, [1, 2, 3, 4]).unwrap();
        assert_eq!(buf.pixel_count(), 6);
        assert!(buf.pixels().all(|p| p == [1, 2, 3, 4]));
    }
}
