//! Remapping of native-grid fields onto the target grid.

pub mod interpolation;

pub use interpolation::{bilinear_interpolate, nearest_interpolate, AxisLocator, Bracket};

use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};
use ocean_common::{
    BoundingBox, GridSpec, GriddedSeries, HarmonizeError, HarmonizeResult, RawField,
    RemappedField,
};
use tracing::debug;

use crate::config::GridProcessorConfig;
use crate::types::InterpolationMethod;

/// Resamples [`RawField`]s onto a fixed [`GridSpec`].
///
/// Pure: the same input always produces the same output, and cells whose
/// native neighbourhood holds no valid data come out as NaN.
#[derive(Debug, Clone)]
pub struct GridRemapper {
    grid: GridSpec,
    method: InterpolationMethod,
}

/// Native brackets for every target row and column, computed once per remap.
struct RemapPlan {
    rows: Vec<Option<Bracket>>,
    cols: Vec<Option<Bracket>>,
}

impl GridRemapper {
    pub fn new(grid: GridSpec, method: InterpolationMethod) -> Self {
        Self { grid, method }
    }

    pub fn from_config(config: &GridProcessorConfig) -> Self {
        Self::new(config.grid, config.interpolation)
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Remap every time step of `raw` onto the target grid.
    ///
    /// Fails with `GridMismatch` when the native coordinates are missing or
    /// cannot describe the data array.
    pub fn remap(&self, raw: &RawField) -> HarmonizeResult<RemappedField> {
        let label = raw.meta.to_string();
        self.grid
            .validate()
            .map_err(|e| HarmonizeError::grid_mismatch(&label, e.to_string()))?;

        let (steps, nlat, nlon) = raw.data.dim();
        if raw.lat.len() != nlat || raw.lon.len() != nlon {
            return Err(HarmonizeError::grid_mismatch(
                &label,
                format!(
                    "coordinates ({} lat, {} lon) do not match data shape ({}, {})",
                    raw.lat.len(),
                    raw.lon.len(),
                    nlat,
                    nlon
                ),
            ));
        }
        if raw.dates.len() != steps {
            return Err(HarmonizeError::grid_mismatch(
                &label,
                format!("{} dates for {} time steps", raw.dates.len(), steps),
            ));
        }

        let lat_axis = AxisLocator::latitude(&raw.lat, &label)?;
        let lon_axis = AxisLocator::longitude(&raw.lon, &label)?;
        let plan = RemapPlan {
            rows: self.grid.lats().into_iter().map(|lat| lat_axis.locate(lat)).collect(),
            cols: self.grid.lons().into_iter().map(|lon| lon_axis.locate(lon)).collect(),
        };

        let full_coverage = self.covers_target(raw, lon_axis.is_global());
        let (ny, nx) = self.grid.shape();
        let mut output = Array3::from_elem((steps, ny, nx), f64::NAN);
        output
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(raw.data.axis_iter(Axis(0)).into_par_iter())
            .for_each(|(dst, src)| self.remap_step(&plan, raw, src, dst));

        let missing = output.iter().filter(|v| v.is_nan()).count();
        debug!(
            field = %label,
            steps,
            native_shape = ?(nlat, nlon),
            method = %self.method,
            global_lon = lon_axis.is_global(),
            full_coverage,
            missing_cells = missing,
            "Remapped field onto target grid"
        );

        let series = GriddedSeries::new(raw.meta.clone(), raw.dates.clone(), output)?;
        Ok(RemappedField::new(series))
    }

    /// Whether the native coordinates span every target cell centre. A
    /// global longitude axis covers any longitude.
    fn covers_target(&self, raw: &RawField, global_lon: bool) -> bool {
        let span = |coords: &[f64]| {
            coords
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| (lo.min(c), hi.max(c)))
        };
        let target = self.grid.bbox();
        let (min_lat, max_lat) = span(&raw.lat);
        let (min_lon, max_lon) = if global_lon {
            (target.min_lon, target.max_lon)
        } else {
            span(&raw.lon)
        };
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat).contains_bbox(&target)
    }

    fn remap_step(
        &self,
        plan: &RemapPlan,
        raw: &RawField,
        src: ArrayView2<'_, f64>,
        mut dst: ArrayViewMut2<'_, f64>,
    ) {
        let value_at = |j: usize, i: usize| {
            let v = src[[j, i]];
            if raw.is_missing(v) {
                f64::NAN
            } else {
                v
            }
        };

        for (row, lat) in plan.rows.iter().enumerate() {
            let Some(lat) = lat else { continue };
            for (col, lon) in plan.cols.iter().enumerate() {
                let Some(lon) = lon else { continue };
                let stencil = interpolation::corners(*lat, *lon, value_at);
                dst[[row, col]] = match self.method {
                    InterpolationMethod::Nearest => nearest_interpolate(&stencil),
                    InterpolationMethod::Bilinear => bilinear_interpolate(&stencil),
                };
            }
        }
    }
}
