//! Static land/ocean mask over the target grid.

use crate::error::{HarmonizeError, HarmonizeResult};
use crate::GridSpec;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Boolean field aligned to a [`GridSpec`]: `true` marks a valid ocean cell,
/// `false` a land (excluded) cell.
///
/// Built once per run and shared read-only by the gap filler, the
/// normalizer and the masked metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OceanMask {
    cells: Array2<bool>,
}

impl OceanMask {
    /// Wrap an existing boolean array shaped `(ny, nx)`.
    pub fn new(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    /// A mask marking every cell as ocean.
    pub fn all_ocean(ny: usize, nx: usize) -> Self {
        Self::new(Array2::from_elem((ny, nx), true))
    }

    /// Read a `mask1`-style array: 1 = ocean, 0 = land.
    ///
    /// Anything other than exactly 0 or 1 (including NaN) is rejected rather
    /// than guessed at.
    pub fn from_mask1(values: ArrayView2<'_, f64>) -> HarmonizeResult<Self> {
        let mut cells = Array2::from_elem(values.raw_dim(), false);
        for ((row, col), &value) in values.indexed_iter() {
            cells[[row, col]] = if value == 1.0 {
                true
            } else if value == 0.0 {
                false
            } else {
                return Err(HarmonizeError::InvalidMask(format!(
                    "mask1 value {} at (row {}, col {}) is neither 0 nor 1",
                    value, row, col
                )));
            };
        }
        Ok(Self { cells })
    }

    /// Derive a mask from one field: finite cells are ocean.
    pub fn from_valid_cells(field: ArrayView2<'_, f64>) -> Self {
        Self::new(field.map(|v| v.is_finite()))
    }

    /// Export as a `mask1`-style array.
    pub fn to_mask1(&self) -> Array2<f64> {
        self.cells.map(|&ocean| if ocean { 1.0 } else { 0.0 })
    }

    /// Mask shape `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn cells(&self) -> ArrayView2<'_, bool> {
        self.cells.view()
    }

    /// Whether `(row, col)` is an ocean cell. Out-of-range cells are land.
    #[inline]
    pub fn is_ocean(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).copied().unwrap_or(false)
    }

    /// Number of ocean cells.
    pub fn ocean_count(&self) -> usize {
        self.cells.iter().filter(|&&ocean| ocean).count()
    }

    /// Ocean cells as `(row, col)` in row-major order.
    pub fn ocean_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .indexed_iter()
            .filter_map(|(idx, &ocean)| ocean.then_some(idx))
    }

    /// Check the mask is aligned with `grid`.
    pub fn ensure_matches(&self, grid: &GridSpec) -> HarmonizeResult<()> {
        self.ensure_shape("ocean mask", grid.shape())
    }

    /// Check that a 2-D array shape agrees with the mask.
    pub fn ensure_shape(&self, what: &str, shape: (usize, usize)) -> HarmonizeResult<()> {
        if self.shape() != shape {
            let (ny, nx) = self.shape();
            return Err(HarmonizeError::shape_mismatch(what, &[ny, nx], &[shape.0, shape.1]));
        }
        Ok(())
    }
}
