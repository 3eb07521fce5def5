//! Pixel geo-location and scan-line timing.
//!
//! Binning only needs two things from a source product besides its samples:
//! where a pixel is on the globe and when its scan line was acquired. Both
//! are expressed as traits so any product reader can plug in.

use chrono::{DateTime, Utc};

use crate::error::{BinningError, Result};

/// Modified Julian day of the Unix epoch (1970-01-01T00:00:00Z).
pub const MJD_UNIX_EPOCH: f64 = 40_587.0;

const MICROS_PER_DAY: f64 = 86_400.0 * 1_000_000.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Maps continuous pixel coordinates to geographic positions.
///
/// Pixel `(x, y)` covers `[x, x + 1) x [y, y + 1)`; its center is at
/// `(x + 0.5, y + 0.5)`.
pub trait GeoCoding: Send + Sync {
    /// Position of a pixel coordinate, `None` if it does not see the Earth.
    fn geo_pos(&self, pixel_x: f64, pixel_y: f64) -> Option<GeoPos>;
}

/// Maps a (possibly fractional) scan line to its acquisition time in MJD.
pub trait TimeCoding: Send + Sync {
    fn mjd(&self, scan_line: f64) -> f64;
}

// ============================================================================
// Time conversion
// ============================================================================

/// Convert a UTC timestamp to a modified Julian day.
pub fn datetime_to_mjd(time: &DateTime<Utc>) -> f64 {
    MJD_UNIX_EPOCH + time.timestamp_micros() as f64 / MICROS_PER_DAY
}

/// Convert a modified Julian day to a UTC timestamp (microsecond precision).
pub fn mjd_to_datetime(mjd: f64) -> Option<DateTime<Utc>> {
    if !mjd.is_finite() {
        return None;
    }
    let micros = ((mjd - MJD_UNIX_EPOCH) * MICROS_PER_DAY).round();
    DateTime::from_timestamp_micros(micros as i64)
}

// ============================================================================
// Geo-codings
// ============================================================================

/// Geo-coding of a plate carrée raster: latitude and longitude are linear in
/// the pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineGeoCoding {
    /// Latitude of the upper edge of row 0.
    pub lat_origin: f64,
    /// Longitude of the left edge of column 0.
    pub lon_origin: f64,
    /// Degrees of latitude per pixel (negative for north-up rasters).
    pub lat_step: f64,
    /// Degrees of longitude per pixel.
    pub lon_step: f64,
}

impl AffineGeoCoding {
    pub fn new(lat_origin: f64, lon_origin: f64, lat_step: f64, lon_step: f64) -> Self {
        Self {
            lat_origin,
            lon_origin,
            lat_step,
            lon_step,
        }
    }

    /// North-up geo-coding covering a bounding box with a `width` x `height`
    /// raster.
    pub fn from_bounds(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
        width: usize,
        height: usize,
    ) -> Self {
        Self::new(
            max_lat,
            min_lon,
            -(max_lat - min_lat) / height as f64,
            (max_lon - min_lon) / width as f64,
        )
    }
}

impl GeoCoding for AffineGeoCoding {
    #[inline]
    fn geo_pos(&self, pixel_x: f64, pixel_y: f64) -> Option<GeoPos> {
        let pos = GeoPos::new(
            self.lat_origin + pixel_y * self.lat_step,
            self.lon_origin + pixel_x * self.lon_step,
        );
        pos.is_valid().then_some(pos)
    }
}

/// Geo-coding of a fixed-grid geostationary image (GOES-R ABI style).
///
/// Pixel coordinates are converted to scan angles, which are intersected with
/// the Earth ellipsoid (GOES-R PUG Volume 4, Section 4.2.8). Pixels looking
/// past the limb have no position.
#[derive(Debug, Clone, PartialEq)]
pub struct GeostationaryGeoCoding {
    /// Distance from the Earth center to the satellite (meters).
    h: f64,
    /// Equatorial radius (meters).
    req: f64,
    /// Polar radius (meters).
    rpol: f64,
    /// Sub-satellite longitude (radians).
    lambda_0: f64,
    /// Scan angle of the center of pixel column 0 (radians).
    x_origin: f64,
    /// Scan angle of the center of pixel row 0 (radians).
    y_origin: f64,
    dx: f64,
    dy: f64,
}

impl GeostationaryGeoCoding {
    /// Build from the fixed-grid projection attributes of a GOES product.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        perspective_point_height: f64,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        longitude_origin_deg: f64,
        x_origin: f64,
        y_origin: f64,
        dx: f64,
        dy: f64,
    ) -> Self {
        Self {
            h: perspective_point_height + semi_major_axis,
            req: semi_major_axis,
            rpol: semi_minor_axis,
            lambda_0: longitude_origin_deg.to_radians(),
            x_origin,
            y_origin,
            dx,
            dy,
        }
    }

    /// GOES-East (75.2°W) CONUS sector at 2 km: 2500 x 1500 pixels.
    pub fn goes_east_conus() -> Self {
        Self::new(
            35_786_023.0,
            6_378_137.0,
            6_356_752.314_14,
            -75.2,
            -0.101_346,
            0.128_226,
            0.000_056,
            -0.000_056,
        )
    }

    /// Scan angles (x, y) in radians to (lat, lon) in degrees.
    fn scan_to_geo(&self, x: f64, y: f64) -> Option<GeoPos> {
        let (sin_x, cos_x) = x.sin_cos();
        let (sin_y, cos_y) = y.sin_cos();
        let axis_ratio_sq = (self.req / self.rpol).powi(2);

        let a = sin_x.powi(2) + cos_x.powi(2) * (cos_y.powi(2) + axis_ratio_sq * sin_y.powi(2));
        let b = -2.0 * self.h * cos_x * cos_y;
        let c = self.h.powi(2) - self.req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        let sx = rs * cos_x * cos_y;
        let sy = -rs * sin_x;
        let sz = rs * cos_x * sin_y;

        let lat = (axis_ratio_sq * sz / (self.h - sx).hypot(sy)).atan();
        let lon = self.lambda_0 - sy.atan2(self.h - sx);
        Some(GeoPos::new(lat.to_degrees(), lon.to_degrees()))
    }
}

impl GeoCoding for GeostationaryGeoCoding {
    fn geo_pos(&self, pixel_x: f64, pixel_y: f64) -> Option<GeoPos> {
        let x = self.x_origin + (pixel_x - 0.5) * self.dx;
        let y = self.y_origin + (pixel_y - 0.5) * self.dy;
        self.scan_to_geo(x, y)
    }
}

// ============================================================================
// Time-codings
// ============================================================================

/// Scan-line time interpolated linearly between product start and stop.
///
/// Line coordinate 0 maps to the start time and `num_lines` to the stop time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTimeCoding {
    start_mjd: f64,
    stop_mjd: f64,
    num_lines: f64,
}

impl LinearTimeCoding {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>, num_lines: usize) -> Result<Self> {
        if stop < start {
            return Err(BinningError::invalid_input(format!(
                "product stop time {} precedes start time {}",
                stop, start
            )));
        }
        if num_lines == 0 {
            return Err(BinningError::invalid_input("time coding needs at least one line"));
        }
        Ok(Self {
            start_mjd: datetime_to_mjd(&start),
            stop_mjd: datetime_to_mjd(&stop),
            num_lines: num_lines as f64,
        })
    }

    pub fn start_mjd(&self) -> f64 {
        self.start_mjd
    }

    pub fn stop_mjd(&self) -> f64 {
        self.stop_mjd
    }
}

impl TimeCoding for LinearTimeCoding {
    #[inline]
    fn mjd(&self, scan_line: f64) -> f64 {
        self.start_mjd + (self.stop_mjd - self.start_mjd) * (scan_line / self.num_lines)
    }
}

/// A single acquisition time for the whole product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTimeCoding(pub f64);

impl TimeCoding for ConstantTimeCoding {
    fn mjd(&self, _scan_line: f64) -> f64 {
        self.0
    }
}
