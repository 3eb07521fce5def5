//! Reduced Gaussian grid backed by row tables.
//!
//! Each table lists one line per grid row (both hemispheres, north first):
//!
//! ```text
//! # comment
//! <reduced_columns>\t<regular_columns>\t<center_latitude>
//! ```
//!
//! The regular column count is informational and ignored. Tables for every
//! supported resolution are bundled with the crate; parsed grids are cached
//! process-wide and shared read-only.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use super::{center_longitudes, RowLayout};
use crate::error::{BinningError, Result};

/// Supported per-hemisphere row counts (`N` of an `N<rows>` Gaussian grid).
pub const ALLOWED_ROW_COUNTS: [u32; 11] = [32, 48, 80, 128, 160, 200, 256, 320, 400, 512, 640];

/// Parsed grids, keyed by per-hemisphere row count.
static GRID_CACHE: Lazy<RwLock<HashMap<u32, Arc<ReducedGaussianGrid>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn bundled_table(row_count: u32) -> Option<&'static str> {
    Some(match row_count {
        32 => include_str!("../../grids/N32.txt"),
        48 => include_str!("../../grids/N48.txt"),
        80 => include_str!("../../grids/N80.txt"),
        128 => include_str!("../../grids/N128.txt"),
        160 => include_str!("../../grids/N160.txt"),
        200 => include_str!("../../grids/N200.txt"),
        256 => include_str!("../../grids/N256.txt"),
        320 => include_str!("../../grids/N320.txt"),
        400 => include_str!("../../grids/N400.txt"),
        512 => include_str!("../../grids/N512.txt"),
        640 => include_str!("../../grids/N640.txt"),
        _ => return None,
    })
}

/// Reduced Gaussian grid with `2 * row_count` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedGaussianGrid {
    row_count: u32,
    layout: RowLayout,
}

impl ReducedGaussianGrid {
    /// Load the bundled grid for a per-hemisphere row count.
    ///
    /// The first load of each resolution parses its table; later loads return
    /// the cached instance.
    pub fn load(row_count: u32) -> Result<Arc<Self>> {
        {
            let cache = GRID_CACHE.read().unwrap_or_else(|e| e.into_inner());
            if let Some(grid) = cache.get(&row_count) {
                return Ok(Arc::clone(grid));
            }
        }

        if !ALLOWED_ROW_COUNTS.contains(&row_count) {
            return Err(BinningError::config(format!(
                "unsupported reduced Gaussian row count {}, expected one of {:?}",
                row_count, ALLOWED_ROW_COUNTS
            )));
        }
        let table = bundled_table(row_count)
            .ok_or_else(|| BinningError::config(format!("no bundled table for N{}", row_count)))?;

        let mut cache = GRID_CACHE.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have parsed it while we waited for the lock.
        if let Some(grid) = cache.get(&row_count) {
            return Ok(Arc::clone(grid));
        }

        let grid = Arc::new(Self::from_table_str(row_count, table)?);
        debug!(
            row_count,
            num_bins = grid.num_bins(),
            "Loaded reduced Gaussian grid"
        );
        cache.insert(row_count, Arc::clone(&grid));
        Ok(grid)
    }

    /// Load a grid from a table file on disk.
    pub fn from_table_file(row_count: u32, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BinningError::config(format!("cannot read grid table {}: {}", path.display(), e))
        })?;
        Self::from_table_str(row_count, &text)
    }

    /// Parse a grid table.
    ///
    /// Fails if `row_count` is not an allowed resolution, if the table does
    /// not hold exactly `2 * row_count` rows, or if a field is malformed.
    pub fn from_table_str(row_count: u32, text: &str) -> Result<Self> {
        if !ALLOWED_ROW_COUNTS.contains(&row_count) {
            return Err(BinningError::config(format!(
                "unsupported reduced Gaussian row count {}, expected one of {:?}",
                row_count, ALLOWED_ROW_COUNTS
            )));
        }

        let expected_rows = 2 * row_count as usize;
        let mut column_counts = Vec::with_capacity(expected_rows);
        let mut center_lats = Vec::with_capacity(expected_rows);

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(BinningError::config(format!(
                    "grid table line {}: expected 3 tab-separated fields, got {}",
                    line_no + 1,
                    fields.len()
                )));
            }

            let columns: u32 = fields[0].parse().map_err(|_| {
                BinningError::config(format!(
                    "grid table line {}: invalid column count '{}'",
                    line_no + 1,
                    fields[0]
                ))
            })?;
            let lat: f64 = fields[2].parse().map_err(|_| {
                BinningError::config(format!(
                    "grid table line {}: invalid latitude '{}'",
                    line_no + 1,
                    fields[2]
                ))
            })?;

            if columns == 0 {
                return Err(BinningError::config(format!(
                    "grid table line {}: column count must be > 0",
                    line_no + 1
                )));
            }
            if !(-90.0..=90.0).contains(&lat) {
                return Err(BinningError::config(format!(
                    "grid table line {}: latitude {} out of range",
                    line_no + 1,
                    lat
                )));
            }
            if let Some(&previous) = center_lats.last() {
                if lat >= previous {
                    return Err(BinningError::config(format!(
                        "grid table line {}: latitudes must decrease from north to south",
                        line_no + 1
                    )));
                }
            }

            column_counts.push(columns);
            center_lats.push(lat);
        }

        if column_counts.len() != expected_rows {
            return Err(BinningError::config(format!(
                "grid table for N{} must have {} rows, found {}",
                row_count,
                expected_rows,
                column_counts.len()
            )));
        }

        Ok(Self {
            row_count,
            layout: RowLayout::new(column_counts, center_lats),
        })
    }

    /// Per-hemisphere row count.
    pub fn row_count(&self) -> u32 {
        self.row_count
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

    pub fn center_lat(&self, row: usize) -> f64 {
        self.layout.center_lat(row)
    }

    pub fn center_longitudes(&self, row: usize) -> Vec<f64> {
        center_longitudes(self.row_column_count(row))
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
