//! Shared test utilities for the ocean harmonization workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic ocean field generators
//! - Common records, grids and masks
//! - Approximate-equality assertions for scalars and arrays
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
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
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate element-wise equality of two arrays.
///
/// Both sides must iterate over `f64` values in the same order (ndarray
/// arrays, views, slices). NaN matches NaN.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_arrays_approx_eq;
///
/// assert_arrays_approx_eq!(filled.series().data(), expected.view(), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_arrays_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: Vec<f64> = $left.iter().copied().collect();
        let right: Vec<f64> = $right.iter().copied().collect();
        let epsilon: f64 = $epsilon as f64;
        assert_eq!(left.len(), right.len(), "arrays differ in length");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if l.is_nan() && r.is_nan() {
                continue;
            }
            let diff = (l - r).abs();
            if !(diff <= epsilon) {
                panic!(
                    "assertion failed: `(left ≈ right)` at flat index {}\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                    i, l, r, diff, epsilon
                );
            }
        }
    }};
}
