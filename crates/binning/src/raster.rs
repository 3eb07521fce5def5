//! In-memory raster planes and slice rectangles.

use crate::error::{BinningError, Result};

/// A two-dimensional plane of samples addressable by pixel coordinates.
pub trait SamplePlane: Send + Sync {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Sample at integer pixel `(x, y)`. Callers stay within bounds.
    fn sample(&self, x: usize, y: usize) -> f64;
}

/// Row-major single-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPlane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl RasterPlane {
    /// Wrap row-major data.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(BinningError::invalid_input(format!(
                "raster of {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A plane with the same value everywhere.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a plane by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get the value at a pixel, `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }
}

impl SamplePlane for RasterPlane {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn sample(&self, x: usize, y: usize) -> f64 {
        f64::from(self.data[y * self.width + x])
    }
}

/// Rectangular slice of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full extent of a `width` x `height` raster.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Check that the rectangle lies inside a `width` x `height` raster.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }

    /// Split into horizontal stripes of at most `rows` lines each.
    pub fn split_rows(&self, rows: usize) -> Vec<PixelRect> {
        let rows = rows.max(1);
        (self.y..self.y + self.height)
            .step_by(rows)
            .map(|y| {
                let h = rows.min(self.y + self.height - y);
                PixelRect::new(self.x, y, self.width, h)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_plane_size_check() {
        assert!(RasterPlane::new(3, 2, vec![0.0; 6]).is_ok());
        assert!(RasterPlane::new(3, 2, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_raster_plane_access() {
        let plane = RasterPlane::from_fn(4, 3, |x, y| (x * 10 + y) as f32);
        assert_eq!(plane.get(2, 1), Some(21.0));
        assert_eq!(plane.get(4, 0), None);
        assert_eq!(plane.sample(3, 2), 32.0);
        assert_eq!(plane.width(), 4);
        assert_eq!(plane.height(), 3);
    }

    #[test]
    fn test_split_rows() {
        let rect = PixelRect::new(2, 5, 10, 7);
        let stripes = rect.split_rows(3);
        assert_eq!(stripes.len(), 3);
        assert_eq!(stripes[0], PixelRect::new(2, 5, 10, 3));
        assert_eq!(stripes[2], PixelRect::new(2, 11, 10, 1));
        assert_eq!(
            stripes.iter().map(|s| s.pixel_count()).sum::<usize>(),
            rect.pixel_count()
        );
    }

    #[test]
    fn test_fits_within() {
        assert!(PixelRect::new(0, 0, 4, 4).fits_within(4, 4));
        assert!(!PixelRect::new(1, 0, 4, 4).fits_within(4, 4));
    }
}
