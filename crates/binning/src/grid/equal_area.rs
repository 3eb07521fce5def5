//! Integerized sinusoidal equal-area grid (SeaWiFS binning layout).

use super::RowLayout;
use crate::error::{BinningError, Result};

/// Equal-area grid with `rows` latitude bands of height `180 / rows`.
///
/// Row `i` carries `round(2 * rows * cos(lat_i))` columns (at least one), so
/// every bin covers roughly the same surface area.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualAreaGrid {
    layout: RowLayout,
}

impl EqualAreaGrid {
    /// Create an equal-area grid with the given total row count.
    pub fn new(num_rows: u32) -> Result<Self> {
        if num_rows < 2 || num_rows % 2 != 0 {
            return Err(BinningError::config(format!(
                "equal-area grid row count must be even and >= 2, got {}",
                num_rows
            )));
        }

        let height = 180.0 / f64::from(num_rows);
        let (column_counts, center_lats): (Vec<u32>, Vec<f64>) = (0..num_rows)
            .map(|row| {
                let lat = 90.0 - (f64::from(row) + 0.5) * height;
                let columns = (2.0 * f64::from(num_rows) * lat.to_radians().cos()).round() as u32;
                (columns.max(1), lat)
            })
            .unzip();

        Ok(Self {
            layout: RowLayout::new(column_counts, center_lats),
        })
    }

    pub fn num_rows(&self) -> usize {
        self.layout.num_rows()
    }

    pub fn num_bins(&self) -> u64 {
        self.layout.num_bins()
    }

    pub fn row_column_count(&self, row: usize) -> u32 {
        self.layout.column_count(row)
    }

    pub fn first_bin_index(&self, row: usize) -> u64 {
        self.layout.first_bin_index(row)
    }

    pub fn bin_index_of(&self, lat: f64, lon: f64) -> u64 {
        self.layout.bin_index_of(lat, lon)
    }

    pub fn row_index(&self, bin_index: u64) -> usize {
        self.layout.row_of_bin(bin_index)
    }

    pub fn center_lat_lon(&self, bin_index: u64) -> (f64, f64) {
        self.layout.center_lat_lon(bin_index)
    }
}
