//! Common test fixtures for binning tests.
//!
//! This module provides pre-defined swath footprints, observation times and
//! reduced Gaussian grid tables.

use std::io::Write;

use tempfile::NamedTempFile;

/// Common swath footprints for testing.
pub mod swath {
    /// Equatorial Pacific, a few degrees across
    pub const EQUATORIAL: SwathSpec = SwathSpec {
        width: 64,
        height: 48,
        min_lon: -150.0,
        max_lon: -142.0,
        min_lat: -3.0,
        max_lat: 3.0,
    };

    /// North Atlantic, mid latitudes
    pub const NORTH_ATLANTIC: SwathSpec = SwathSpec {
        width: 80,
        height: 60,
        min_lon: -40.0,
        max_lon: -20.0,
        min_lat: 40.0,
        max_lat: 55.0,
    };

    /// Straddles the antimeridian
    pub const DATELINE: SwathSpec = SwathSpec {
        width: 40,
        height: 20,
        min_lon: 170.0,
        max_lon: 190.0,
        min_lat: -10.0,
        max_lat: 0.0,
    };

    /// Touches the north pole
    pub const ARCTIC: SwathSpec = SwathSpec {
        width: 36,
        height: 10,
        min_lon: -180.0,
        max_lon: 180.0,
        min_lat: 85.0,
        max_lat: 90.0,
    };

    /// Tiny 4x4 swath
    pub const SMALL: SwathSpec = SwathSpec {
        width: 4,
        height: 4,
        min_lon: 0.0,
        max_lon: 2.0,
        min_lat: 0.0,
        max_lat: 2.0,
    };

    /// Swath footprint on a plate carrée raster.
    #[derive(Debug, Clone, Copy)]
    pub struct SwathSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl SwathSpec {
        /// Returns the total number of pixels.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the pixel size in degrees.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / self.width as f64;
            let dy = (self.max_lat - self.min_lat) / self.height as f64;
            (dx, dy)
        }

        /// Returns the bounding box as (min_lon, min_lat, max_lon, max_lat).
        pub fn bbox(&self) -> (f64, f64, f64, f64) {
            (self.min_lon, self.min_lat, self.max_lon, self.max_lat)
        }

        /// Center of a pixel, north-up, as (lat, lon).
        pub fn pixel_center(&self, x: usize, y: usize) -> (f64, f64) {
            let (dx, dy) = self.resolution();
            (
                self.max_lat - (y as f64 + 0.5) * dy,
                self.min_lon + (x as f64 + 0.5) * dx,
            )
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// 2024-01-15T00:00:00Z as a modified Julian day
    pub const MJD_2024_01_15: f64 = 60324.0;

    /// Start and stop of a typical polar-orbiter granule (5 minutes)
    pub const GRANULE_START: &str = "2024-01-15T12:00:00Z";
    pub const GRANULE_STOP: &str = "2024-01-15T12:05:00Z";
}

/// Common aggregation variables.
pub mod variables {
    pub const CHL: &str = "chl";
    pub const SST: &str = "sst";
    pub const FLAGS: &str = "flags";
}

/// Reduced Gaussian grid tables.
pub mod tables {
    /// Synthetic table with `2 * n` rows, north to south.
    ///
    /// Latitudes are evenly spaced row centers; column counts follow
    /// `4n * cos(lat)` with a floor of 20. The second column holds the
    /// regular column count `4n`, which readers ignore.
    pub fn synthetic_reduced_table(n: u32) -> String {
        let rows = 2 * n;
        let regular = 4 * n;
        let mut text = format!("# synthetic reduced Gaussian grid N{}\n", n);
        text.push_str("# reduced\tregular\tlatitude\n");
        for row in 0..rows {
            let lat = 90.0 - (row as f64 + 0.5) * 180.0 / rows as f64;
            let columns = ((regular as f64) * lat.to_radians().cos()).ceil() as u32;
            text.push_str(&format!("{}\t{}\t{:.6}\n", columns.max(20), regular, lat));
        }
        text
    }

    /// Table whose third row has a non-numeric column count.
    pub fn malformed_column_table(n: u32) -> String {
        let text = synthetic_reduced_table(n);
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        // Two header lines, then data.
        if let Some(line) = lines.get_mut(4) {
            if let Some((_, rest)) = line.split_once('\t') {
                *line = format!("abc\t{}", rest);
            }
        }
        lines.join("\n")
    }

    /// Table with one row missing.
    pub fn truncated_table(n: u32) -> String {
        let text = synthetic_reduced_table(n);
        let mut lines: Vec<&str> = text.lines().collect();
        lines.pop();
        lines.join("\n")
    }
}

/// Writes `contents` to a fresh temporary file that lives as long as the
/// returned handle.
pub fn write_temp_file(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swath_spec() {
        assert_eq!(swath::SMALL.size(), 16);
        let (dx, dy) = swath::SMALL.resolution();
        assert!((dx - 0.5).abs() < 1e-12);
        assert!((dy - 0.5).abs() < 1e-12);
        assert_eq!(swath::SMALL.pixel_center(0, 0), (1.75, 0.25));
    }

    #[test]
    fn test_synthetic_table_shape() {
        let text = tables::synthetic_reduced_table(32);
        let data: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(data.len(), 64);
        assert!(data[0].starts_with("20\t128\t"));
        assert!(data[32].starts_with("128\t128\t"));
    }

    #[test]
    fn test_broken_tables() {
        assert!(tables::malformed_column_table(32).contains("\nabc\t128\t"));
        let truncated = tables::truncated_table(32);
        assert_eq!(truncated.lines().filter(|l| !l.starts_with('#')).count(), 63);
    }

    #[test]
    fn test_write_temp_file() {
        let file = write_temp_file("hello").unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "hello");
    }
}
