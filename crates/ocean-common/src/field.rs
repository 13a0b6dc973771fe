//! Field types flowing through the pipeline.
//!
//! ```text
//! RawField ──remap──► RemappedField ──fill──► FilledField ──► normalize
//! (native grid)       (target grid,          (no missing
//!                      NaN = missing)          ocean cells)
//! ```
//!
//! All of them are immutable once built; every stage returns a new value.

use crate::catalog::{Source, Variable};
use crate::error::{HarmonizeError, HarmonizeResult};
use crate::mask::OceanMask;
use crate::time::TimeRange;
use chrono::NaiveDate;
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a record: which source, which variable, which years.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMeta {
    pub source: Source,
    pub variable: Variable,
    pub period: TimeRange,
}

impl FieldMeta {
    pub fn new(source: Source, variable: Variable, period: TimeRange) -> Self {
        Self {
            source,
            variable,
            period,
        }
    }
}

impl fmt::Display for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.source, self.variable, self.period)
    }
}

// ============================================================================
// Native-grid input
// ============================================================================

/// A time series of 2-D fields on a rectilinear native grid.
///
/// `data` is shaped `(time, lat, lon)`; `lat` and `lon` hold the native axis
/// coordinates. Nothing here is validated: the remapper checks the
/// coordinates against the data when it needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    pub meta: FieldMeta,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub dates: Vec<NaiveDate>,
    pub data: Array3<f64>,
    /// Fill sentinel used by the source, in addition to NaN.
    #[serde(default)]
    pub missing_value: Option<f64>,
}

impl RawField {
    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Whether a raw value counts as missing.
    #[inline]
    pub fn is_missing(&self, value: f64) -> bool {
        !value.is_finite() || self.missing_value.is_some_and(|m| value == m)
    }
}

// ============================================================================
// Target-grid series
// ============================================================================

/// A time series of 2-D fields on the target grid, shaped `(time, ny, nx)`,
/// with one date per time step. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedSeries {
    meta: FieldMeta,
    dates: Vec<NaiveDate>,
    data: Array3<f64>,
}

impl GriddedSeries {
    /// Build a series, checking that there is exactly one date per step.
    pub fn new(meta: FieldMeta, dates: Vec<NaiveDate>, data: Array3<f64>) -> HarmonizeResult<Self> {
        let steps = data.len_of(Axis(0));
        if dates.len() != steps {
            return Err(HarmonizeError::shape_mismatch(
                format!("dates of {}", meta),
                &[steps],
                &[dates.len()],
            ));
        }
        Ok(Self { meta, dates, data })
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Spatial shape `(ny, nx)`.
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.data.dim();
        (ny, nx)
    }

    /// One time step.
    pub fn step(&self, t: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), t)
    }

    /// Ocean cells that are missing (non-finite), as `(time, row, col)` in
    /// ascending order.
    pub fn missing_ocean_cells<'a>(
        &'a self,
        mask: &'a OceanMask,
    ) -> impl Iterator<Item = (usize, usize, usize)> + 'a {
        self.data
            .indexed_iter()
            .filter(move |&((_, row, col), value)| mask.is_ocean(row, col) && !value.is_finite())
            .map(|(idx, _)| idx)
    }

    /// Keep only the steps dated within `period`; the meta takes the new period.
    pub fn restrict_to(&self, period: TimeRange) -> GriddedSeries {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter_map(|(t, date)| period.contains(date).then_some(t))
            .collect();
        let mut meta = self.meta.clone();
        meta.period = period;
        Self {
            meta,
            dates: keep.iter().map(|&t| self.dates[t]).collect(),
            data: self.data.select(Axis(0), &keep),
        }
    }

    pub fn into_parts(self) -> (FieldMeta, Vec<NaiveDate>, Array3<f64>) {
        (self.meta, self.dates, self.data)
    }
}

/// Output of the grid remapper: aligned to the target grid, may contain
/// missing (NaN) cells anywhere, including over ocean.
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedField(GriddedSeries);

impl RemappedField {
    pub fn new(series: GriddedSeries) -> Self {
        Self(series)
    }

    pub fn series(&self) -> &GriddedSeries {
        &self.0
    }

    pub fn into_series(self) -> GriddedSeries {
        self.0
    }
}

/// A remapped field with every ocean cell finite.
///
/// Land cells carry whatever the remapper produced and must be ignored
/// downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledField(GriddedSeries);

impl FilledField {
    /// Wrap a series after checking that no ocean cell is missing.
    pub fn try_new(series: GriddedSeries, mask: &OceanMask) -> HarmonizeResult<Self> {
        mask.ensure_shape(&format!("field {}", series.meta()), series.spatial_shape())?;
        if let Some((time_index, row, col)) = series.missing_ocean_cells(mask).next() {
            return Err(HarmonizeError::MissingOceanCell {
                field: series.meta().to_string(),
                time_index,
                row,
                col,
            });
        }
        Ok(Self(series))
    }

    pub fn series(&self) -> &GriddedSeries {
        &self.0
    }

    pub fn into_series(self) -> GriddedSeries {
        self.0
    }

    /// Sub-period of a filled field; still filled.
    pub fn restrict_to(&self, period: TimeRange) -> FilledField {
        FilledField(self.0.restrict_to(period))
    }

    /// Treat the filled field as remapper output again (for re-filling).
    pub fn into_remapped(self) -> RemappedField {
        RemappedField(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn meta() -> FieldMeta {
        FieldMeta::new(Source::Oras5, Variable::Sss, TimeRange::new(2000, 2000))
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2000, i as u32 % 12 + 1, 15).unwrap())
            .collect()
    }

    #[test]
    fn test_meta_display() {
        assert_eq!(meta().to_string(), "oras5/sss 2000-2000");
    }

    #[test]
    fn test_series_requires_one_date_per_step() {
        let data = Array3::<f64>::zeros((3, 2, 2));
        assert!(GriddedSeries::new(meta(), dates(3), data.clone()).is_ok());
        let err = GriddedSeries::new(meta(), dates(2), data).unwrap_err();
        assert!(matches!(err, HarmonizeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_missing_ocean_cells_ignores_land() {
        let mut data = Array3::<f64>::zeros((2, 2, 2));
        data[[0, 0, 1]] = f64::NAN; // land
        data[[1, 1, 0]] = f64::NAN; // ocean
        let mask = OceanMask::new(ndarray::array![[true, false], [true, true]]);
        let series = GriddedSeries::new(meta(), dates(2), data).unwrap();

        let missing: Vec<_> = series.missing_ocean_cells(&mask).collect();
        assert_eq!(missing, vec![(1, 1, 0)]);

        let err = FilledField::try_new(series, &mask).unwrap_err();
        assert!(matches!(
            err,
            HarmonizeError::MissingOceanCell {
                time_index: 1,
                row: 1,
                col: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_filled_accepts_nan_on_land() {
        let mut data = Array3::<f64>::ones((1, 2, 2));
        data[[0, 0, 1]] = f64::NAN;
        let mask = OceanMask::new(ndarray::array![[true, false], [true, true]]);
        let series = GriddedSeries::new(meta(), dates(1), data).unwrap();
        assert!(FilledField::try_new(series, &mask).is_ok());
    }

    #[test]
    fn test_restrict_to_period() {
        let dates: Vec<NaiveDate> = (2000..2003)
            .map(|y| NaiveDate::from_ymd_opt(y, 6, 15).unwrap())
            .collect();
        let data = Array3::from_shape_fn((3, 1, 1), |(t, _, _)| t as f64);
        let meta = FieldMeta::new(Source::Oras5, Variable::Sss, TimeRange::new(2000, 2002));
        let series = GriddedSeries::new(meta, dates, data).unwrap();

        let sub = series.restrict_to(TimeRange::new(2001, 2005));
        assert_eq!(sub.n_times(), 2);
        assert_eq!(sub.meta().period, TimeRange::new(2001, 2005));
        assert_eq!(sub.data()[[0, 0, 0]], 1.0);
        assert_eq!(sub.dates()[1], NaiveDate::from_ymd_opt(2002, 6, 15).unwrap());
    }

    #[test]
    fn test_raw_missing_sentinel() {
        let raw = RawField {
            meta: meta(),
            lon: vec![0.0, 1.0],
            lat: vec![0.0, 1.0],
            dates: dates(1),
            data: Array3::zeros((1, 2, 2)),
            missing_value: Some(1e20),
        };
        assert!(raw.is_missing(1e20));
        assert!(raw.is_missing(f64::NAN));
        assert!(!raw.is_missing(35.0));
        assert_eq!(raw.n_times(), 1);
    }
}
