//! Test data generators for creating synthetic ocean fields.
//!
//! These generators create predictable, verifiable salinity-like patterns
//! that can be used across the test suite.

use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Array3};
use ocean_common::{FieldMeta, GriddedSeries, OceanMask, RawField};

/// Creates evenly spaced axis coordinates.
///
/// # Arguments
///
/// * `first` - First coordinate
/// * `step` - Spacing (negative for a descending axis)
/// * `n` - Number of points
///
/// # Example
///
/// ```
/// use test_utils::create_axis;
///
/// assert_eq!(create_axis(10.0, -0.5, 3), vec![10.0, 9.5, 9.0]);
/// ```
pub fn create_axis(first: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| first + step * i as f64).collect()
}

/// Salinity-like value at a position and date, in psu.
///
/// A gentle east-west and north-south gradient around 35 psu plus a seasonal
/// cycle with a 0.3 psu amplitude peaking in April.
pub fn salinity_at(lon: f64, lat: f64, date: &NaiveDate) -> f64 {
    let month0 = date.month0() as f64;
    let seasonal = 0.3 * (2.0 * std::f64::consts::PI * month0 / 12.0).sin();
    35.0 + 0.05 * (lon - 30.0) - 0.03 * (lat + 30.0) + seasonal
}

/// Creates a native-grid field from a value function.
///
/// # Arguments
///
/// * `meta` - Record identity
/// * `lon` / `lat` - Native axes
/// * `dates` - One date per time step
/// * `value` - `value(lon, lat, date)` for every node
///
/// # Returns
///
/// A [`RawField`] shaped `(dates, lat, lon)` without a missing sentinel.
pub fn create_raw_field<F>(
    meta: FieldMeta,
    lon: Vec<f64>,
    lat: Vec<f64>,
    dates: Vec<NaiveDate>,
    value: F,
) -> RawField
where
    F: Fn(f64, f64, &NaiveDate) -> f64,
{
    let data = Array3::from_shape_fn((dates.len(), lat.len(), lon.len()), |(t, j, i)| {
        value(lon[i], lat[j], &dates[t])
    });
    RawField {
        meta,
        lon,
        lat,
        dates,
        data,
        missing_value: None,
    }
}

/// Creates a target-grid series whose value depends only on the calendar month.
///
/// Useful for climatology tests: every step in month `m` holds
/// `month_value(m)` at every cell.
pub fn create_monthly_constant_series<F>(
    meta: FieldMeta,
    dates: Vec<NaiveDate>,
    ny: usize,
    nx: usize,
    month_value: F,
) -> GriddedSeries
where
    F: Fn(u32) -> f64,
{
    let data = Array3::from_shape_fn((dates.len(), ny, nx), |(t, _, _)| {
        month_value(dates[t].month())
    });
    GriddedSeries::new(meta, dates, data).expect("one date per step")
}

/// Creates a target-grid salinity series from [`salinity_at`] with a small
/// deterministic per-cell perturbation.
///
/// # Arguments
///
/// * `meta` - Record identity
/// * `dates` - One date per time step
/// * `ny`, `nx` - Spatial shape
/// * `seed` - Seed for the perturbation
pub fn create_salinity_series(
    meta: FieldMeta,
    dates: Vec<NaiveDate>,
    ny: usize,
    nx: usize,
    seed: u32,
) -> GriddedSeries {
    let data = Array3::from_shape_fn((dates.len(), ny, nx), |(t, row, col)| {
        let noise = (simple_hash(col as u32, row as u32, seed.wrapping_add(t as u32)) % 1000)
            as f64
            / 10_000.0;
        salinity_at(30.0 + col as f64, -30.0 + row as f64, &dates[t]) + noise
    });
    GriddedSeries::new(meta, dates, data).expect("one date per step")
}

/// Creates a mask with a triangular coast in the south-west corner.
///
/// Cells with `row + col < coast` are land; everything else is ocean.
///
/// # Example
///
/// ```
/// use test_utils::create_coastal_mask;
///
/// let mask = create_coastal_mask(4, 4, 2);
/// assert!(!mask.is_ocean(0, 1));
/// assert!(mask.is_ocean(1, 1));
/// ```
pub fn create_coastal_mask(ny: usize, nx: usize, coast: usize) -> OceanMask {
    OceanMask::new(Array2::from_shape_fn((ny, nx), |(row, col)| row + col >= coast))
}

/// Sets the given `(time, row, col)` cells to NaN.
pub fn punch_holes(data: &mut Array3<f64>, cells: &[(usize, usize, usize)]) {
    for &(t, row, col) in cells {
        data[[t, row, col]] = f64::NAN;
    }
}

/// Overwrites every land cell of every step with `value`.
///
/// Used to check that nothing downstream reads land.
pub fn poison_land(data: &mut Array3<f64>, mask: &OceanMask, value: f64) {
    for ((_, row, col), v) in data.indexed_iter_mut() {
        if !mask.is_ocean(row, col) {
            *v = value;
        }
    }
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
