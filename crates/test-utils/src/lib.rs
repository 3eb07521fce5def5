//! Test support for the binning crates.
//!
//! Synthetic sample planes, masks, swath footprints and reduced Gaussian
//! table fixtures. Generators return row-major `Vec<f32>` buffers so this
//! crate stays independent of `binning`; wrap them in a `RasterPlane` at the
//! call site:
//!
//! ```ignore
//! use test_utils::{create_sst_grid, swath};
//!
//! let spec = swath::SMALL;
//! let sst = RasterPlane::new(spec.width, spec.height, create_sst_grid(spec.width, spec.height))?;
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// NaN equals NaN, so fill values can be compared directly.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        if !(left.is_nan() && right.is_nan()) {
            let diff = (left - right).abs();
            if !(diff <= epsilon) {
                panic!(
                    "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                    left, right, diff, epsilon
                );
            }
        }
    }};
}

/// Macro for element-wise approximate equality of two `f64` slices.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_slice_approx_eq;
///
/// assert_slice_approx_eq!(&[1.0, f64::NAN], &[1.0000001, f64::NAN], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_slice_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (l, r) in left.iter().zip(right.iter()) {
            $crate::assert_approx_eq!(*l, *r, $epsilon);
        }
    }};
}
