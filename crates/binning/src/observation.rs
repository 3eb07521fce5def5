//! Lazy extraction of observations from a raster slice.
//!
//! An [`ObservationExtractor`] walks a [`SamplePointer`] and, for every
//! position that passes the validity mask and has a geographic position,
//! yields an [`Observation`]: the pixel's samples plus where and when they
//! were measured.
//!
//! The mask check is a type parameter. [`NoMask`] compiles the check away,
//! [`PlaneMask`] reads a mask plane per pixel; both produce identical
//! sequences when the mask is non-zero everywhere.

use crate::error::{BinningError, Result};
use crate::geocoding::{GeoCoding, TimeCoding};
use crate::raster::SamplePlane;
use crate::sample_pointer::SamplePointer;

/// One geo-located, time-stamped sample vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub lat: f64,
    pub lon: f64,
    /// Acquisition time in modified Julian days, 0 if the source has no time.
    pub mjd: f64,
    samples: Vec<f64>,
}

impl Observation {
    pub fn new(lat: f64, lon: f64, mjd: f64, samples: Vec<f64>) -> Self {
        Self {
            lat,
            lon,
            mjd,
            samples,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample(&self, index: usize) -> f64 {
        self.samples[index]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ============================================================================
// Mask strategies
// ============================================================================

/// Per-pixel validity test.
pub trait MaskCheck {
    fn is_valid(&self, x: usize, y: usize) -> bool;
}

/// Every pixel is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMask;

impl MaskCheck for NoMask {
    #[inline(always)]
    fn is_valid(&self, _x: usize, _y: usize) -> bool {
        true
    }
}

/// A pixel is valid when its mask sample is non-zero (and not NaN).
#[derive(Clone, Copy)]
pub struct PlaneMask<'a> {
    plane: &'a dyn SamplePlane,
}

impl<'a> PlaneMask<'a> {
    pub fn new(plane: &'a dyn SamplePlane) -> Self {
        Self { plane }
    }
}

impl MaskCheck for PlaneMask<'_> {
    #[inline]
    fn is_valid(&self, x: usize, y: usize) -> bool {
        let value = self.plane.sample(x, y);
        value != 0.0 && !value.is_nan()
    }
}

// ============================================================================
// Extractor
// ============================================================================

enum CursorState {
    /// Nothing fetched ahead.
    Ready,
    /// The next observation was fetched by `has_next`.
    Peeked(Observation),
    Exhausted,
}

/// Forward-only, single-pass observation sequence over one raster slice.
pub struct ObservationExtractor<'a, M: MaskCheck> {
    pointer: SamplePointer,
    planes: Vec<&'a dyn SamplePlane>,
    mask: M,
    geo_coding: &'a dyn GeoCoding,
    time_coding: Option<&'a dyn TimeCoding>,
    state: CursorState,
}

impl<'a, M: MaskCheck> ObservationExtractor<'a, M> {
    /// Create an extractor.
    ///
    /// `planes` supplies one sample per variable; all planes must have the
    /// same size. Without a `time_coding` every observation has `mjd = 0`.
    pub fn new(
        pointer: SamplePointer,
        planes: Vec<&'a dyn SamplePlane>,
        mask: M,
        geo_coding: &'a dyn GeoCoding,
        time_coding: Option<&'a dyn TimeCoding>,
    ) -> Self {
        Self {
            pointer,
            planes,
            mask,
            geo_coding,
            time_coding,
            state: CursorState::Ready,
        }
    }

    /// Whether another observation remains. May read ahead one observation.
    pub fn has_next(&mut self) -> bool {
        if matches!(self.state, CursorState::Ready) {
            self.state = match self.fetch() {
                Some(observation) => CursorState::Peeked(observation),
                None => CursorState::Exhausted,
            };
        }
        matches!(self.state, CursorState::Peeked(_))
    }

    /// Take the next observation, failing once the sequence is exhausted.
    pub fn next_observation(&mut self) -> Result<Observation> {
        match std::mem::replace(&mut self.state, CursorState::Ready) {
            CursorState::Peeked(observation) => Ok(observation),
            CursorState::Ready => match self.fetch() {
                Some(observation) => Ok(observation),
                None => {
                    self.state = CursorState::Exhausted;
                    Err(BinningError::Exhausted)
                }
            },
            CursorState::Exhausted => {
                self.state = CursorState::Exhausted;
                Err(BinningError::Exhausted)
            }
        }
    }

    fn fetch(&mut self) -> Option<Observation> {
        while let Ok(position) = self.pointer.move_next() {
            if !self.mask.is_valid(position.x, position.y) {
                continue;
            }
            let Some(pos) = self.geo_coding.geo_pos(position.pixel_x, position.pixel_y) else {
                continue;
            };
            let samples = self
                .planes
                .iter()
                .map(|plane| plane.sample(position.x, position.y))
                .collect();
            let mjd = self
                .time_coding
                .map_or(0.0, |tc| tc.mjd(position.pixel_y));
            return Some(Observation::new(pos.lat, pos.lon, mjd, samples));
        }
        None
    }
}

impl<M: MaskCheck> Iterator for ObservationExtractor<'_, M> {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        self.next_observation().ok()
    }
}

impl<M: MaskCheck> std::iter::FusedIterator for ObservationExtractor<'_, M> {}

/// Check that planes, mask and slice describe the same raster.
pub fn validate_planes(
    planes: &[&dyn SamplePlane],
    mask: Option<&dyn SamplePlane>,
    pointer_rect: crate::raster::PixelRect,
) -> Result<()> {
    let Some(first) = planes.first().or(mask.as_ref()) else {
        return Err(BinningError::invalid_input("a pass needs at least one plane"));
    };
    let (width, height) = (first.width(), first.height());

    for plane in planes.iter().chain(mask.as_ref()) {
        if plane.width() != width || plane.height() != height {
            return Err(BinningError::invalid_input(format!(
                "plane of {}x{} does not match raster size {}x{}",
                plane.width(),
                plane.height(),
                width,
                height
            )));
        }
    }

    if !pointer_rect.fits_within(width, height) {
        return Err(BinningError::invalid_input(format!(
            "slice {:?} exceeds raster size {}x{}",
            pointer_rect, width, height
        )));
    }
    Ok(())
}

/// Observation sequence with or without a validity mask.
pub enum ObservationStream<'a> {
    Unmasked(ObservationExtractor<'a, NoMask>),
    Masked(ObservationExtractor<'a, PlaneMask<'a>>),
}

impl<'a> ObservationStream<'a> {
    /// Pick the extractor variant for an optional mask plane.
    pub fn new(
        pointer: SamplePointer,
        planes: Vec<&'a dyn SamplePlane>,
        mask: Option<&'a dyn SamplePlane>,
        geo_coding: &'a dyn GeoCoding,
        time_coding: Option<&'a dyn TimeCoding>,
    ) -> Self {
        match mask {
            Some(plane) => Self::Masked(ObservationExtractor::new(
                pointer,
                planes,
                PlaneMask::new(plane),
                geo_coding,
                time_coding,
            )),
            None => Self::Unmasked(ObservationExtractor::new(
                pointer,
                planes,
                NoMask,
                geo_coding,
                time_coding,
            )),
        }
    }

    pub fn has_next(&mut self) -> bool {
        match self {
            Self::Unmasked(inner) => inner.has_next(),
            Self::Masked(inner) => inner.has_next(),
        }
    }

    pub fn next_observation(&mut self) -> Result<Observation> {
        match self {
            Self::Unmasked(inner) => inner.next_observation(),
            Self::Masked(inner) => inner.next_observation(),
        }
    }
}

impl Iterator for ObservationStream<'_> {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        match self {
            Self::Unmasked(inner) => inner.next(),
            Self::Masked(inner) => inner.next(),
        }
    }
}

impl std::iter::FusedIterator for ObservationStream<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::{AffineGeoCoding, ConstantTimeCoding};
    use crate::raster::{PixelRect, RasterPlane};

    fn geo() -> AffineGeoCoding {
        AffineGeoCoding::from_bounds(0.0, 0.0, 4.0, 4.0, 4, 4)
    }

    #[test]
    fn test_unmasked_reads_all_pixels() {
        let plane = RasterPlane::from_fn(4, 4, |x, y| (y * 4 + x) as f32);
        let geo = geo();
        let pointer = SamplePointer::new(PixelRect::full(4, 4), 1).unwrap();
        let extractor = ObservationExtractor::new(pointer, vec![&plane as &dyn SamplePlane], NoMask, &geo, None);

        let observations: Vec<_> = extractor.collect();
        assert_eq!(observations.len(), 16);
        assert_eq!(observations[5].samples(), &[5.0]);
        assert!((observations[5].lat - 2.5).abs() < 1e-12);
        assert!((observations[5].lon - 1.5).abs() < 1e-12);
        assert!(observations.iter().all(|o| o.mjd == 0.0));
    }

    #[test]
    fn test_masked_skips_zero_pixels() {
        let plane = RasterPlane::from_fn(4, 4, |x, _| x as f32);
        let mask = RasterPlane::from_fn(4, 4, |x, y| if (x + y) % 2 == 0 { 1.0 } else { 0.0 });
        let geo = geo();
        let pointer = SamplePointer::new(PixelRect::full(4, 4), 1).unwrap();
        let extractor =
            ObservationExtractor::new(pointer, vec![&plane as &dyn SamplePlane], PlaneMask::new(&mask), &geo, None);
        assert_eq!(extractor.count(), 8);
    }

    #[test]
    fn test_time_coding_uses_scan_line() {
        let plane = RasterPlane::filled(2, 2, 1.0);
        let geo = geo();
        let time = ConstantTimeCoding(58_000.25);
        let pointer = SamplePointer::new(PixelRect::full(2, 2), 1).unwrap();
        let mut extractor =
            ObservationExtractor::new(pointer, vec![&plane as &dyn SamplePlane], NoMask, &geo, Some(&time));
        assert_eq!(extractor.next_observation().unwrap().mjd, 58_000.25);
    }

    #[test]
    fn test_next_after_exhaustion_is_error() {
        let plane = RasterPlane::filled(1, 1, 3.0);
        let geo = geo();
        let pointer = SamplePointer::new(PixelRect::full(1, 1), 1).unwrap();
        let mut extractor = ObservationExtractor::new(pointer, vec![&plane as &dyn SamplePlane], NoMask, &geo, None);

        assert!(extractor.has_next());
        assert!(extractor.has_next());
        assert_eq!(extractor.next_observation().unwrap().samples(), &[3.0]);
        assert!(!extractor.has_next());
        assert!(matches!(extractor.next_observation(), Err(BinningError::Exhausted)));
        assert!(matches!(extractor.next_observation(), Err(BinningError::Exhausted)));
        assert!(extractor.next().is_none());
    }

    #[test]
    fn test_pixels_without_position_are_skipped() {
        let plane = RasterPlane::filled(1, 4, 1.0);
        // Rows 0 and 1 lie beyond the north pole.
        let geo = AffineGeoCoding::new(92.0, 0.0, -1.0, 1.0);
        let pointer = SamplePointer::new(PixelRect::full(1, 4), 1).unwrap();
        let stream = ObservationStream::new(pointer, vec![&plane as &dyn SamplePlane], None, &geo, None);
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn test_validate_planes() {
        let a = RasterPlane::filled(4, 4, 1.0);
        let b = RasterPlane::filled(4, 3, 1.0);
        assert!(validate_planes(&[&a], None, PixelRect::full(4, 4)).is_ok());
        assert!(validate_planes(&[&a, &b], None, PixelRect::full(4, 4)).is_err());
        assert!(validate_planes(&[&a], Some(&b), PixelRect::full(4, 4)).is_err());
        assert!(validate_planes(&[&a], None, PixelRect::new(1, 0, 4, 4)).is_err());
        assert!(validate_planes(&[], None, PixelRect::full(4, 4)).is_err());
    }
}
