//! Decoded raster images shared between the import subsystem, the node
//! store and the render graph.
//!
//! Pixels are tightly packed RGBA8, row 0 is the top row. Sampling takes a
//! normalized `uv` in scene orientation: `v = 0` is the *bottom* edge,
//! matching the y-up canvas.

use kurbo::{Point, Size};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BitmapError {
    #[error("bitmap {width}x{height} needs {expected} bytes, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("bitmap dimensions must be non-zero")]
    Empty,
}

/// An immutable RGBA8 bitmap.
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Process-unique id, used by presenters to cache GPU uploads.
    id: u64,
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap decoded RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BitmapError> {
        if width == 0 || height == 0 {
            return Err(BitmapError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(BitmapError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Ok(Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// A bitmap where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, BitmapError> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::from_rgba8(width, height, pixels)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel size as a kurbo `Size`.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn pixels(&self) -> &Arc<Vec<u8>> {
        &self.pixels
    }

    /// Alpha of the pixel under a normalized coordinate, or `None` when the
    /// coordinate falls outside the image.
    pub fn alpha_at(&self, uv: Point) -> Option<u8> {
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return None;
        }
        let x = (uv.x * self.width as f64).floor() as usize;
        let from_bottom = (uv.y * self.height as f64).floor() as usize;
        let row = self.height as usize - 1 - from_bottom;
        let offset = (row * self.width as usize + x) * 4 + 3;
        self.pixels.get(offset).copied()
    }

    /// Write one pixel. Only meaningful while the bitmap is uniquely owned
    /// (e.g. building test fixtures); shared pixels are copied on write.
    pub fn set_pixel(&mut self, x: u32, row: u32, rgba: [u8; 4]) {
        if x >= self.width || row >= self.height {
            return;
        }
        let offset = (row as usize * self.width as usize + x as usize) * 4;
        let pixels = Arc::make_mut(&mut self.pixels);
        pixels[offset..offset + 4].copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Bitmap::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            BitmapError::SizeMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
        assert_eq!(Bitmap::from_rgba8(0, 4, vec![]).unwrap_err(), BitmapError::Empty);
    }

    #[test]
    fn alpha_sampling_is_y_up() {
        let mut bmp = Bitmap::filled(2, 2, [255, 255, 255, 0]).unwrap();
        // Top-left pixel in image rows is the upper-left quadrant in scene space.
        bmp.set_pixel(0, 0, [255, 0, 0, 255]);

        assert_eq!(bmp.alpha_at(Point::new(0.25, 0.75)), Some(255));
        assert_eq!(bmp.alpha_at(Point::new(0.25, 0.25)), Some(0));
        assert_eq!(bmp.alpha_at(Point::new(0.75, 0.75)), Some(0));
    }

    #[test]
    fn alpha_outside_is_none() {
        let bmp = Bitmap::filled(4, 4, [0, 0, 0, 255]).unwrap();
        assert_eq!(bmp.alpha_at(Point::new(-0.1, 0.5)), None);
        assert_eq!(bmp.alpha_at(Point::new(0.5, 1.0)), None);
        assert_eq!(bmp.alpha_at(Point::new(0.0, 0.0)), Some(255));
    }

    #[test]
    fn ids_are_distinct() {
        let a = Bitmap::filled(1, 1, [0; 4]).unwrap();
        let b = Bitmap::filled(1, 1, [0; 4]).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
