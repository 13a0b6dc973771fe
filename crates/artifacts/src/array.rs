//! JSON-safe array encoding.
//!
//! JSON has no NaN, so arrays are stored as a shape plus row-major values in
//! which missing (non-finite) entries are `null`.

use crate::error::{ArtifactError, Result};
use ndarray::{ArrayD, ArrayView, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

/// An n-dimensional `f64` array as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArray {
    shape: Vec<usize>,
    values: Vec<Option<f64>>,
}

impl StoredArray {
    pub fn from_view<D: Dimension>(data: ArrayView<'_, f64, D>) -> Self {
        Self {
            shape: data.shape().to_vec(),
            values: data.iter().map(|v| v.is_finite().then_some(*v)).collect(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Trailing `(ny, nx)` of a 2-D or 3-D array.
    pub fn spatial_shape(&self) -> Option<(usize, usize)> {
        match self.shape.as_slice() {
            [.., ny, nx] => Some((*ny, *nx)),
            _ => None,
        }
    }

    /// Decode; `null` entries come back as NaN.
    pub fn to_array(&self, name: &str) -> Result<ArrayD<f64>> {
        let values = self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        ArrayD::from_shape_vec(IxDyn(&self.shape), values).map_err(|_| {
            ArtifactError::invalid_shape(
                name,
                &self.shape,
                format!("{} stored values do not fill the shape", self.values.len()),
            )
        })
    }

    /// Whether the value count agrees with the shape.
    pub fn is_consistent(&self) -> bool {
        self.shape.iter().product::<usize>() == self.values.len()
    }
}
