//! Test data generators for creating synthetic swath-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All buffers are row-major.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a constant grid.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a chlorophyll-like grid in mg/m³.
///
/// Values are strictly positive and span roughly two orders of magnitude
/// (0.05 to 5), the way ocean colour products do. Low values sit in the
/// middle of the swath, high values toward the edges.
pub fn create_chlorophyll_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let center_x = width as f32 / 2.0;
    for row in 0..height {
        for col in 0..width {
            let edge = ((col as f32 + 0.5 - center_x) / center_x.max(1.0)).abs();
            let along = row as f32 / height.max(1) as f32;
            // log10 range -1.3 .. 0.7
            let log_chl = -1.3 + 1.5 * edge + 0.5 * along;
            data.push(10f32.powf(log_chl));
        }
    }
    data
}

/// Creates a sea surface temperature grid in °C.
///
/// Warm at the top row (28°C), cold at the bottom row (2°C), with a small
/// cross-track ripple so that neighbouring pixels differ.
pub fn create_sst_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let y_factor = row as f32 / (height.max(2) - 1) as f32;
            let ripple = 0.25 * ((col as f32) * 0.7).sin();
            data.push(28.0 - 26.0 * y_factor + ripple);
        }
    }
    data
}

/// Creates a grid of uniformly distributed random values in `[min, max)`.
///
/// The same seed always yields the same grid.
pub fn create_random_grid(width: usize, height: usize, min: f32, max: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.gen_range(min..max)).collect()
}

/// Sprinkles NaN (missing data) into a grid at the given fraction of cells.
pub fn insert_missing(data: &mut [f32], fraction: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for value in data.iter_mut() {
        if rng.gen_bool(fraction.clamp(0.0, 1.0)) {
            *value = f32::NAN;
        }
    }
}

/// Creates a validity mask: 1.0 for valid pixels, 0.0 for masked ones.
///
/// Every `period`-th pixel in raster order is masked.
pub fn create_periodic_mask(width: usize, height: usize, period: usize) -> Vec<f32> {
    (0..width * height)
        .map(|i| if period > 0 && i % period == 0 { 0.0 } else { 1.0 })
        .collect()
}

/// Creates a checkerboard validity mask with square cells of `cell` pixels.
pub fn create_checker_mask(width: usize, height: usize, cell: usize) -> Vec<f32> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let valid = (row / cell + col / cell) % 2 == 0;
            data.push(if valid { 1.0 } else { 0.0 });
        }
    }
    data
}

/// Returns every pixel coordinate of a raster in a shuffled order.
///
/// Used to check that binning does not depend on pixel visitation order.
pub fn shuffled_pixel_order(width: usize, height: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<(usize, usize)> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .collect();
    // Fisher-Yates
    for i in (1..order.len()).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }
    order
}
