//! Distance-stencil filling of missing ocean cells.
//!
//! Remapping leaves gaps along coastlines where the native land mask and
//! the target mask disagree. Each missing ocean cell takes the inverse
//! distance weighted mean of the donors on the nearest ring that has any.
//! Donors are read from the unfilled input only, so cells can be processed
//! in any order (and in parallel) with the same result.

pub mod stencil;

pub use stencil::{StencilOffset, StencilTable};

use ndarray::parallel::prelude::*;
use ndarray::{ArrayView2, ArrayViewMut2, Axis};
use ocean_common::{
    FilledField, GriddedSeries, HarmonizeError, HarmonizeResult, NeumaierSum, OceanMask,
    RemappedField,
};
use tracing::debug;

use crate::config::GridProcessorConfig;
use crate::types::FillReport;

/// Fills missing ocean cells of a [`RemappedField`].
#[derive(Debug, Clone)]
pub struct GapFiller {
    table: StencilTable,
}

/// Outcome of filling one time step.
struct StepFill {
    filled: usize,
    max_radius: usize,
}

/// First cell of a step that could not be filled.
struct Unfillable {
    row: usize,
    col: usize,
}

impl GapFiller {
    pub fn new(max_radius: usize) -> Self {
        Self {
            table: StencilTable::new(max_radius),
        }
    }

    pub fn from_config(config: &GridProcessorConfig) -> Self {
        Self::new(config.max_fill_radius)
    }

    pub fn max_radius(&self) -> usize {
        self.table.max_radius()
    }

    pub fn table(&self) -> &StencilTable {
        &self.table
    }

    /// Fill every missing ocean cell.
    pub fn fill(&self, field: RemappedField, mask: &OceanMask) -> HarmonizeResult<FilledField> {
        self.fill_with_report(field, mask).map(|(filled, _)| filled)
    }

    /// Fill every missing ocean cell and report what was done.
    ///
    /// Fails with `UnfillableCell` for the first failing cell in
    /// `(time, row, col)` order.
    pub fn fill_with_report(
        &self,
        field: RemappedField,
        mask: &OceanMask,
    ) -> HarmonizeResult<(FilledField, FillReport)> {
        let series = field.into_series();
        let label = series.meta().to_string();
        mask.ensure_shape(&format!("field {}", label), series.spatial_shape())?;

        let steps = series.n_times();
        if series.missing_ocean_cells(mask).next().is_none() {
            debug!(field = %label, steps, "No missing ocean cells, fill skipped");
            let report = FillReport {
                filled_per_step: vec![0; steps],
                max_radius_used: 0,
            };
            return Ok((FilledField::try_new(series, mask)?, report));
        }

        let (meta, dates, input) = series.into_parts();
        let mut output = input.clone();

        let outcomes: Vec<Result<StepFill, Unfillable>> = output
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(input.axis_iter(Axis(0)).into_par_iter())
            .map(|(dst, src)| self.fill_step(src, dst, mask))
            .collect();

        let mut report = FillReport::default();
        for (time_index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(step) => {
                    report.filled_per_step.push(step.filled);
                    report.max_radius_used = report.max_radius_used.max(step.max_radius);
                }
                Err(Unfillable { row, col }) => {
                    return Err(HarmonizeError::UnfillableCell {
                        field: label,
                        time_index,
                        date: dates.get(time_index).copied(),
                        row,
                        col,
                        max_radius: self.max_radius(),
                    });
                }
            }
        }

        metrics::counter!("harmonizer_cells_filled_total").increment(report.total_filled() as u64);
        debug!(
            field = %label,
            steps,
            cells_filled = report.total_filled(),
            max_radius_used = report.max_radius_used,
            "Filled missing ocean cells"
        );

        let series = GriddedSeries::new(meta, dates, output)?;
        Ok((FilledField::try_new(series, mask)?, report))
    }

    fn fill_step(
        &self,
        src: ArrayView2<'_, f64>,
        mut dst: ArrayViewMut2<'_, f64>,
        mask: &OceanMask,
    ) -> Result<StepFill, Unfillable> {
        let (ny, nx) = src.dim();
        let mut outcome = StepFill {
            filled: 0,
            max_radius: 0,
        };

        for (row, col) in mask.ocean_cells() {
            if src[[row, col]].is_finite() {
                continue;
            }
            let (value, radius) = self
                .fill_cell(src, mask, row, col, ny, nx)
                .ok_or(Unfillable { row, col })?;
            dst[[row, col]] = value;
            outcome.filled += 1;
            outcome.max_radius = outcome.max_radius.max(radius);
        }

        Ok(outcome)
    }

    /// Weighted mean over the first ring holding a donor, with that ring's radius.
    fn fill_cell(
        &self,
        src: ArrayView2<'_, f64>,
        mask: &OceanMask,
        row: usize,
        col: usize,
        ny: usize,
        nx: usize,
    ) -> Option<(f64, usize)> {
        for (radius, ring) in self.table.rings() {
            let mut weighted = NeumaierSum::new();
            let mut weights = NeumaierSum::new();

            for offset in ring {
                let Some((r, c)) = offset.apply(row, col, ny, nx) else {
                    continue;
                };
                let value = src[[r, c]];
                if !mask.is_ocean(r, c) || !value.is_finite() {
                    continue;
                }
                weighted.add(value * offset.weight);
                weights.add(offset.weight);
            }

            if weights.count() > 0 {
                return Some((weighted.total() / weights.total(), radius));
            }
        }
        None
    }
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::from_config(&GridProcessorConfig::default())
    }
}
