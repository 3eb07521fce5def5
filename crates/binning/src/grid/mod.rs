//! Global bin grids.
//!
//! A grid divides the globe into latitude rows, each split into a number of
//! equally wide longitude columns. Bins are numbered row by row starting at
//! the northernmost row, and within a row from -180° eastwards:
//!
//! ```text
//! bin = first_bin_index[row] + column
//! ```
//!
//! Three layouts are supported:
//!
//! - [`RegularGrid`]: equal-angle rows, `2 * rows` columns everywhere
//! - [`ReducedGaussianGrid`]: Gaussian latitudes with row widths shrinking
//!   toward the poles, loaded from bundled row tables
//! - [`EqualAreaGrid`]: integerized sinusoidal rows of approximately equal
//!   cell area

pub mod equal_area;
pub mod reduced;
pub mod regular;

pub use equal_area::EqualAreaGrid;
pub use reduced::{ReducedGaussianGrid, ALLOWED_ROW_COUNTS};
pub use regular::RegularGrid;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::Result;

/// Layout family of a planetary grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// Equal-angle rows and columns.
    Regular,
    /// Reduced Gaussian rows from the bundled tables.
    #[default]
    ReducedGaussian,
    /// Integerized sinusoidal equal-area rows.
    EqualArea,
}

impl GridKind {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "regular" => Some(Self::Regular),
            "reduced_gaussian" | "gaussian" => Some(Self::ReducedGaussian),
            "equal_area" | "sea" => Some(Self::EqualArea),
            _ => None,
        }
    }

    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::ReducedGaussian => "reduced_gaussian",
            Self::EqualArea => "equal_area",
        }
    }
}

impl std::fmt::Display for GridKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Row layout shared by the variable-width grids
// ============================================================================

/// Per-row geometry of a grid whose rows have individual column counts.
///
/// Rows are ordered north to south. `first_bin_index[i]` is the running sum of
/// the column counts of all rows before `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    column_counts: Vec<u32>,
    first_bin_index: Vec<u64>,
    center_lats: Vec<f64>,
    num_bins: u64,
}

impl RowLayout {
    /// Build a layout from per-row column counts and center latitudes.
    ///
    /// Latitudes must be in descending order (north first).
    pub fn new(column_counts: Vec<u32>, center_lats: Vec<f64>) -> Self {
        debug_assert_eq!(column_counts.len(), center_lats.len());
        let mut first_bin_index = Vec::with_capacity(column_counts.len());
        let mut next = 0u64;
        for &count in &column_counts {
            first_bin_index.push(next);
            next += u64::from(count);
        }
        Self {
            column_counts,
            first_bin_index,
            center_lats,
            num_bins: next,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.column_counts.len()
    }

    pub fn num_bins(&self) -> u64 {
        self.num_bins
    }

    pub fn column_count(&self, row: usize) -> u32 {
        self.column_counts[row]
    }

    pub fn first_bin_index(&self, row: usize) -> u64 {
        self.first_bin_index[row]
    }

    pub fn center_lat(&self, row: usize) -> f64 {
        self.center_lats[row]
    }

    /// Find the row whose center latitude is nearest to `lat`.
    ///
    /// Latitudes beyond the outermost row centers clamp to the first or last
    /// row.
    pub fn nearest_row(&self, lat: f64) -> usize {
        let last = self.center_lats.len() - 1;
        // First row strictly south of lat.
        let south = self.center_lats.partition_point(|&c| c >= lat);
        if south == 0 {
            return 0;
        }
        if south > last {
            return last;
        }
        let north = south - 1;
        if self.center_lats[north] - lat <= lat - self.center_lats[south] {
            north
        } else {
            south
        }
    }

    /// Row containing the given bin index.
    pub fn row_of_bin(&self, bin_index: u64) -> usize {
        let row = self.first_bin_index.partition_point(|&first| first <= bin_index);
        row.saturating_sub(1).min(self.num_rows() - 1)
    }

    /// Bin index for a latitude/longitude pair.
    pub fn bin_index_of(&self, lat: f64, lon: f64) -> u64 {
        let row = self.nearest_row(lat);
        self.first_bin_index[row] + u64::from(column_of(lon, self.column_counts[row]))
    }

    /// Center coordinates (lat, lon) of a bin.
    pub fn center_lat_lon(&self, bin_index: u64) -> (f64, f64) {
        let row = self.row_of_bin(bin_index);
        let column = bin_index - self.first_bin_index[row];
        (
            self.center_lats[row],
            center_lon(column as u32, self.column_counts[row]),
        )
    }
}

// ============================================================================
// Longitude helpers
// ============================================================================

/// Wrap a longitude into `[-180, 180)`.
#[inline]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Column of a longitude within a row of `column_count` equally wide columns
/// starting at -180°.
#[inline]
pub fn column_of(lon: f64, column_count: u32) -> u32 {
    let fraction = (normalize_lon(lon) + 180.0) / 360.0;
    let column = (fraction * f64::from(column_count)).floor() as u32;
    column.min(column_count - 1)
}

/// Center longitude of column `i` in a row of `column_count` columns.
#[inline]
pub fn center_lon(i: u32, column_count: u32) -> f64 {
    360.0 * ((f64::from(i) + 0.5) / f64::from(column_count)) - 180.0
}

/// All column center longitudes of a row with `column_count` columns.
pub fn center_longitudes(column_count: u32) -> Vec<f64> {
    (0..column_count).map(|i| center_lon(i, column_count)).collect()
}

// ============================================================================
// Planetary grid
// ============================================================================

/// A global bin grid.
///
/// Immutable after construction and cheap to clone; reduced Gaussian grids
/// share their row tables through an `Arc`.
#[derive(Debug, Clone)]
pub enum PlanetaryGrid {
    Regular(RegularGrid),
    ReducedGaussian(Arc<ReducedGaussianGrid>),
    EqualArea(EqualAreaGrid),
}

impl PlanetaryGrid {
    /// Build the grid described by a configuration.
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        Ok(match config.kind {
            GridKind::Regular => Self::Regular(RegularGrid::new(config.rows)?),
            GridKind::ReducedGaussian => Self::ReducedGaussian(ReducedGaussianGrid::load(config.rows)?),
            GridKind::EqualArea => Self::EqualArea(EqualAreaGrid::new(config.rows)?),
        })
    }

    pub fn kind(&self) -> GridKind {
        match self {
            Self::Regular(_) => GridKind::Regular,
            Self::ReducedGaussian(_) => GridKind::ReducedGaussian,
            Self::EqualArea(_) => GridKind::EqualArea,
        }
    }

    /// Bin index of a geographic position.
    ///
    /// The row is chosen by latitude (clamped to the valid range), the column
    /// by longitude modulo 360°.
    #[inline]
    pub fn bin_index_of(&self, lat: f64, lon: f64) -> u64 {
        match self {
            Self::Regular(grid) => grid.bin_index_of(lat, lon),
            Self::ReducedGaussian(grid) => grid.bin_index_of(lat, lon),
            Self::EqualArea(grid) => grid.bin_index_of(lat, lon),
        }
    }

    /// Total number of bins.
    pub fn num_bins(&self) -> u64 {
        match self {
            Self::Regular(grid) => grid.num_bins(),
            Self::ReducedGaussian(grid) => grid.num_bins(),
            Self::EqualArea(grid) => grid.num_bins(),
        }
    }

    /// Total number of latitude rows.
    pub fn num_rows(&self) -> usize {
        match self {
            Self::Regular(grid) => grid.num_rows(),
            Self::ReducedGaussian(grid) => grid.num_rows(),
            Self::EqualArea(grid) => grid.num_rows(),
        }
    }

    /// Number of columns in a row.
    pub fn row_column_count(&self, row: usize) -> u32 {
        match self {
            Self::Regular(grid) => grid.column_count(),
            Self::ReducedGaussian(grid) => grid.row_column_count(row),
            Self::EqualArea(grid) => grid.row_column_count(row),
        }
    }

    /// Index of the first bin in a row.
    pub fn first_bin_index(&self, row: usize) -> u64 {
        match self {
            Self::Regular(grid) => grid.first_bin_index(row),
            Self::ReducedGaussian(grid) => grid.first_bin_index(row),
            Self::EqualArea(grid) => grid.first_bin_index(row),
        }
    }

    /// Row containing a bin.
    pub fn row_index(&self, bin_index: u64) -> usize {
        match self {
            Self::Regular(grid) => grid.row_index(bin_index),
            Self::ReducedGaussian(grid) => grid.row_index(bin_index),
            Self::EqualArea(grid) => grid.row_index(bin_index),
        }
    }

    /// Center (lat, lon) of a bin in degrees.
    pub fn center_lat_lon(&self, bin_index: u64) -> (f64, f64) {
        match self {
            Self::Regular(grid) => grid.center_lat_lon(bin_index),
            Self::ReducedGaussian(grid) => grid.center_lat_lon(bin_index),
            Self::EqualArea(grid) => grid.center_lat_lon(bin_index),
        }
    }

    /// Column center longitudes of a row.
    pub fn center_longitudes(&self, row: usize) -> Vec<f64> {
        center_longitudes(self.row_column_count(row))
    }
}
