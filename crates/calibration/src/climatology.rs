//! Per-calendar-month long-term means of a reference series.

use chrono::Datelike;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use ocean_common::{
    FieldMeta, FilledField, GriddedSeries, HarmonizeError, HarmonizeResult, NeumaierSum,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of calendar months in a climatology.
pub const MONTHS: usize = 12;

/// Computes monthly means from a [`FilledField`].
///
/// Stateless; the mean of every cell is accumulated with compensated
/// summation in time order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimatologyExtractor;

impl ClimatologyExtractor {
    /// Mean of every time step falling in calendar `month` (1..=12), per cell.
    ///
    /// Fails with `InsufficientClimatologyData` when no step falls in `month`.
    pub fn month_mean(field: &FilledField, month: u32) -> HarmonizeResult<Array2<f64>> {
        if !(1..=12).contains(&month) {
            return Err(HarmonizeError::InvalidMonth(month));
        }
        let series = field.series();
        let (ny, nx) = series.spatial_shape();

        let mut sums = vec![NeumaierSum::new(); ny * nx];
        let mut samples = 0usize;
        for (date, step) in series
            .dates()
            .iter()
            .zip(series.data().axis_iter(Axis(0)))
        {
            if date.month() != month {
                continue;
            }
            samples += 1;
            for (acc, &value) in sums.iter_mut().zip(step.iter()) {
                acc.add(value);
            }
        }

        if samples == 0 {
            return Err(HarmonizeError::InsufficientClimatologyData {
                field: series.meta().to_string(),
                month,
            });
        }

        Ok(Array2::from_shape_fn((ny, nx), |(row, col)| {
            sums[row * nx + col].total() / samples as f64
        }))
    }

    /// All twelve monthly means, January first.
    ///
    /// Months are computed in parallel; the error reported is the one for the
    /// earliest empty month.
    pub fn extract_all(field: &FilledField) -> HarmonizeResult<Climatology> {
        let months: Vec<HarmonizeResult<Array2<f64>>> = (1..=MONTHS as u32)
            .into_par_iter()
            .map(|month| Self::month_mean(field, month))
            .collect();
        let months = months.into_iter().collect::<HarmonizeResult<Vec<_>>>()?;

        let (ny, nx) = field.series().spatial_shape();
        let mut stacked = Array3::zeros((MONTHS, ny, nx));
        for (mut dst, mean) in stacked.axis_iter_mut(Axis(0)).zip(&months) {
            dst.assign(mean);
        }

        debug!(
            field = %field.series().meta(),
            steps = field.series().n_times(),
            "Extracted monthly climatology"
        );
        Climatology::new(field.series().meta().clone(), stacked)
    }
}

/// Twelve monthly mean fields shaped `(12, ny, nx)`, January first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climatology {
    meta: FieldMeta,
    months: Array3<f64>,
}

impl Climatology {
    /// Wrap precomputed monthly means; the first axis must hold 12 months.
    pub fn new(meta: FieldMeta, months: Array3<f64>) -> HarmonizeResult<Self> {
        let (n, ny, nx) = months.dim();
        if n != MONTHS {
            return Err(HarmonizeError::shape_mismatch(
                format!("climatology of {}", meta),
                &[MONTHS, ny, nx],
                &[n, ny, nx],
            ));
        }
        Ok(Self { meta, months })
    }

    /// The reference record the climatology was derived from.
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn months(&self) -> ArrayView3<'_, f64> {
        self.months.view()
    }

    /// Mean field of calendar `month` (1..=12).
    pub fn month(&self, month: u32) -> HarmonizeResult<ArrayView2<'_, f64>> {
        if !(1..=12).contains(&month) {
            return Err(HarmonizeError::InvalidMonth(month));
        }
        Ok(self.months.index_axis(Axis(0), month as usize - 1))
    }

    /// Spatial shape `(ny, nx)`.
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.months.dim();
        (ny, nx)
    }

    /// Subtract the matching monthly mean from every step of `field`.
    pub fn anomalies(&self, field: &FilledField) -> HarmonizeResult<GriddedSeries> {
        let series = field.series();
        if series.spatial_shape() != self.spatial_shape() {
            let (ny, nx) = self.spatial_shape();
            let (fy, fx) = series.spatial_shape();
            return Err(HarmonizeError::shape_mismatch(
                format!("anomalies of {}", series.meta()),
                &[ny, nx],
                &[fy, fx],
            ));
        }

        let mut data = series.data().to_owned();
        data.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(series.dates().par_iter())
            .for_each(|(mut step, date)| {
                let mean = self.months.index_axis(Axis(0), date.month0() as usize);
                step -= &mean;
            });

        GriddedSeries::new(series.meta().clone(), series.dates().to_vec(), data)
    }
}
