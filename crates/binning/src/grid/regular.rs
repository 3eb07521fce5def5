//! Regular equal-angle grid.

use super::{center_lon, column_of};
use crate::error::{BinningError, Result};

/// Equal-angle grid with `rows` latitude rows and `2 * rows` columns per row.
///
/// Every cell spans `180 / rows` degrees in both directions. Row 0 is the
/// northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularGrid {
    num_rows: u32,
    column_count: u32,
}

impl RegularGrid {
    /// Create a regular grid with the given total row count.
    pub fn new(num_rows: u32) -> Result<Self> {
        if num_rows < 2 || num_rows % 2 != 0 {
            return Err(BinningError::config(format!(
                "regular grid row count must be even and >= 2, got {}",
                num_rows
            )));
        }
        Ok(Self {
            num_rows,
            column_count: 2 * num_rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows as usize
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    pub fn num_bins(&self) -> u64 {
        u64::from(self.num_rows) * u64::from(self.column_count)
    }

    /// Cell size in degrees.
    pub fn resolution(&self) -> f64 {
        180.0 / f64::from(self.num_rows)
    }

    pub fn first_bin_index(&self, row: usize) -> u64 {
        row as u64 * u64::from(self.column_count)
    }

    /// Row of a latitude, clamped to the grid.
    pub fn row_of(&self, lat: f64) -> usize {
        let row = ((90.0 - lat) / self.resolution()).floor();
        row.clamp(0.0, f64::from(self.num_rows - 1)) as usize
    }

    pub fn center_lat(&self, row: usize) -> f64 {
        90.0 - (row as f64 + 0.5) * self.resolution()
    }

    pub fn bin_index_of(&self, lat: f64, lon: f64) -> u64 {
        self.first_bin_index(self.row_of(lat)) + u64::from(column_of(lon, self.column_count))
    }

    pub fn row_index(&self, bin_index: u64) -> usize {
        (bin_index / u64::from(self.column_count)) as usize
    }

    pub fn center_lat_lon(&self, bin_index: u64) -> (f64, f64) {
        let row = self.row_index(bin_index);
        let column = (bin_index % u64::from(self.column_count)) as u32;
        (self.center_lat(row), center_lon(column, self.column_count))
    }
}
