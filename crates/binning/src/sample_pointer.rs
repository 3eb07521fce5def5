//! Enumeration of pixel and sub-pixel sample positions inside a raster slice.

use crate::error::{BinningError, Result};
use crate::raster::PixelRect;

/// Largest accepted super-sampling factor (sub-samples per pixel edge).
pub const MAX_SUPER_SAMPLING: u32 = 16;

/// A sample position: the integer pixel whose samples are read and the
/// continuous coordinate that is geo-located.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePosition {
    pub x: usize,
    pub y: usize,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

/// Forward-only cursor over the sample positions of a [`PixelRect`].
///
/// Pixels are visited row by row. With a super-sampling factor `S > 1` every
/// pixel is visited `S * S` times at sub-pixel offsets spaced `1 / S` apart;
/// otherwise each pixel is visited once at its center.
#[derive(Debug, Clone)]
pub struct SamplePointer {
    rect: PixelRect,
    offsets: Vec<(f64, f64)>,
    total: usize,
    // Linear index of the next position to visit.
    next: usize,
    current: Option<SamplePosition>,
}

impl SamplePointer {
    pub fn new(rect: PixelRect, super_sampling: u32) -> Result<Self> {
        if !(1..=MAX_SUPER_SAMPLING).contains(&super_sampling) {
            return Err(BinningError::config(format!(
                "super-sampling factor must be in 1..={}, got {}",
                MAX_SUPER_SAMPLING, super_sampling
            )));
        }
        let offsets = sub_pixel_offsets(super_sampling);
        let total = rect
            .width
            .checked_mul(rect.height)
            .and_then(|pixels| pixels.checked_mul(offsets.len()))
            .ok_or_else(|| BinningError::invalid_input("too many sample positions in slice"))?;
        Ok(Self {
            rect,
            offsets,
            total,
            next: 0,
            current: None,
        })
    }

    /// Super-sampling step in pixels (1.0 without super-sampling).
    pub fn step(&self) -> f64 {
        1.0 / (self.offsets.len() as f64).sqrt()
    }

    /// Number of positions, visited or not.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Whether another position remains.
    pub fn can_move(&self) -> bool {
        self.next < self.total
    }

    /// Advance to the next position.
    pub fn move_next(&mut self) -> Result<SamplePosition> {
        if !self.can_move() {
            return Err(BinningError::Exhausted);
        }

        let per_pixel = self.offsets.len();
        let pixel = self.next / per_pixel;
        let (dx, dy) = self.offsets[self.next % per_pixel];
        let x = self.rect.x + pixel % self.rect.width;
        let y = self.rect.y + pixel / self.rect.width;
        self.next += 1;

        let position = SamplePosition {
            x,
            y,
            pixel_x: x as f64 + dx,
            pixel_y: y as f64 + dy,
        };
        self.current = Some(position);
        Ok(position)
    }

    /// The position last moved to.
    pub fn current(&self) -> Option<SamplePosition> {
        self.current
    }
}

impl Iterator for SamplePointer {
    type Item = SamplePosition;

    fn next(&mut self) -> Option<Self::Item> {
        self.move_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SamplePointer {}

/// Offsets inside a pixel for an `s` x `s` sub-sample pattern.
fn sub_pixel_offsets(s: u32) -> Vec<(f64, f64)> {
    let step = 1.0 / f64::from(s);
    let mut offsets = Vec::with_capacity(s as usize * s as usize);
    for j in 0..s {
        for i in 0..s {
            offsets.push(((f64::from(i) + 0.5) * step, (f64::from(j) + 0.5) * step));
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_pixel_centers() {
        let mut pointer = SamplePointer::new(PixelRect::new(1, 2, 2, 2), 1).unwrap();
        assert_eq!(pointer.len(), 4);
        assert_eq!(pointer.step(), 1.0);

        let positions: Vec<_> = pointer.by_ref().map(|p| (p.x, p.y, p.pixel_x, p.pixel_y)).collect();
        assert_eq!(
            positions,
            vec![
                (1, 2, 1.5, 2.5),
                (2, 2, 2.5, 2.5),
                (1, 3, 1.5, 3.5),
                (2, 3, 2.5, 3.5),
            ]
        );
        assert!(!pointer.can_move());
    }

    #[test]
    fn test_super_sampling_offsets() {
        let pointer = SamplePointer::new(PixelRect::new(0, 0, 1, 1), 3).unwrap();
        assert_eq!(pointer.len(), 9);
        assert!((pointer.step() - 1.0 / 3.0).abs() < 1e-12);

        let positions: Vec<_> = pointer.collect();
        assert!(positions.iter().all(|p| p.x == 0 && p.y == 0));
        assert!((positions[0].pixel_x - 1.0 / 6.0).abs() < 1e-12);
        assert!((positions[0].pixel_y - 1.0 / 6.0).abs() < 1e-12);
        assert!((positions[8].pixel_x - 5.0 / 6.0).abs() < 1e-12);
        assert!((positions[8].pixel_y - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_move_after_exhaustion_is_error() {
        let mut pointer = SamplePointer::new(PixelRect::new(0, 0, 1, 1), 1).unwrap();
        assert!(pointer.can_move());
        pointer.move_next().unwrap();
        assert!(!pointer.can_move());
        assert!(matches!(pointer.move_next(), Err(BinningError::Exhausted)));
        assert_eq!(pointer.current().map(|p| (p.x, p.y)), Some((0, 0)));
    }

    #[test]
    fn test_empty_rect() {
        let mut pointer = SamplePointer::new(PixelRect::new(0, 0, 0, 5), 2).unwrap();
        assert!(pointer.is_empty());
        assert!(!pointer.can_move());
        assert!(pointer.next().is_none());
    }

    #[test]
    fn test_rejects_zero_super_sampling() {
        assert!(SamplePointer::new(PixelRect::new(0, 0, 1, 1), 0).is_err());
    }

    #[test]
    fn test_rejects_oversized_super_sampling() {
        let rect = PixelRect::new(0, 0, 1, 1);
        let max = SamplePointer::new(rect, MAX_SUPER_SAMPLING).unwrap();
        assert_eq!(max.len(), (MAX_SUPER_SAMPLING * MAX_SUPER_SAMPLING) as usize);
        assert!(matches!(
            SamplePointer::new(rect, MAX_SUPER_SAMPLING + 1),
            Err(BinningError::Config(_))
        ));
        assert!(matches!(
            SamplePointer::new(rect, 70_000),
            Err(BinningError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_position_count_overflow() {
        let rect = PixelRect::new(0, 0, usize::MAX / 2, 3);
        assert!(matches!(
            SamplePointer::new(rect, 1),
            Err(BinningError::InvalidInput(_))
        ));
        assert!(matches!(
            SamplePointer::new(PixelRect::new(0, 0, usize::MAX / 2, 1), 2),
            Err(BinningError::InvalidInput(_))
        ));
    }
}
