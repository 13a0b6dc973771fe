//! Error metrics restricted to ocean cells.

use ndarray::{ArrayView, ArrayView3, Axis, Dimension, Ix2, Ix3};
use ocean_common::{HarmonizeError, HarmonizeResult, NeumaierSum, OceanMask};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-cell error aggregated by [`masked_loss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
    /// Root mean squared error.
    Rmse,
}

impl MetricKind {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mse" => Some(Self::Mse),
            "mae" => Some(Self::Mae),
            "rmse" => Some(Self::Rmse),
            _ => None,
        }
    }

    #[inline]
    fn cell_error(self, prediction: f64, target: f64) -> f64 {
        let diff = prediction - target;
        match self {
            Self::Mse | Self::Rmse => diff * diff,
            Self::Mae => diff.abs(),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mse => write!(f, "mse"),
            Self::Mae => write!(f, "mae"),
            Self::Rmse => write!(f, "rmse"),
        }
    }
}

/// Mean of the per-cell error over ocean cells only.
///
/// Inputs are `(ny, nx)` or `(time, ny, nx)`; a 3-D input applies the mask to
/// every step. Land cells are never read. Cells are visited step by step in
/// row-major order with compensated summation, so the result is reproducible.
pub fn masked_loss<D: Dimension>(
    prediction: ArrayView<'_, f64, D>,
    target: ArrayView<'_, f64, D>,
    mask: &OceanMask,
    kind: MetricKind,
) -> HarmonizeResult<f64> {
    if prediction.shape() != target.shape() {
        return Err(HarmonizeError::shape_mismatch(
            "prediction vs target",
            target.shape(),
            prediction.shape(),
        ));
    }

    let prediction = as_series(prediction)?;
    let target = as_series(target)?;
    let (_, ny, nx) = prediction.dim();
    mask.ensure_shape("metric input", (ny, nx))?;
    if mask.ocean_count() == 0 {
        return Err(HarmonizeError::EmptyMask);
    }

    let mut acc = NeumaierSum::new();
    for (p_step, t_step) in prediction.outer_iter().zip(target.outer_iter()) {
        for (row, col) in mask.ocean_cells() {
            acc.add(kind.cell_error(p_step[[row, col]], t_step[[row, col]]));
        }
    }

    let mean = acc.total() / acc.count() as f64;
    Ok(match kind {
        MetricKind::Rmse => mean.sqrt(),
        MetricKind::Mse | MetricKind::Mae => mean,
    })
}

/// View a 2-D or 3-D array as `(time, ny, nx)`.
fn as_series<D: Dimension>(data: ArrayView<'_, f64, D>) -> HarmonizeResult<ArrayView3<'_, f64>> {
    let shape = data.shape().to_vec();
    let dyn_view = data.into_dyn();
    let mismatch = || HarmonizeError::shape_mismatch("metric input (2-D or 3-D)", &[0, 0, 0], &shape);
    match dyn_view.ndim() {
        2 => Ok(dyn_view
            .into_dimensionality::<Ix2>()
            .map_err(|_| mismatch())?
            .insert_axis(Axis(0))),
        3 => dyn_view.into_dimensionality::<Ix3>().map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// A metric bound to one mask, for repeated evaluation.
#[derive(Debug, Clone, Copy)]
pub struct MaskedMetric<'a> {
    mask: &'a OceanMask,
    kind: MetricKind,
}

impl<'a> MaskedMetric<'a> {
    pub fn new(mask: &'a OceanMask, kind: MetricKind) -> Self {
        Self { mask, kind }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn evaluate<D: Dimension>(
        &self,
        prediction: ArrayView<'_, f64, D>,
        target: ArrayView<'_, f64, D>,
    ) -> HarmonizeResult<f64> {
        masked_loss(prediction, target, self.mask, self.kind)
    }
}
