//! Error types for the harmonization pipeline.
//!
//! Every error is terminal for the record being processed. None of them
//! describe a transient condition, so callers report them and move on to the
//! next independent record instead of retrying.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using HarmonizeError.
pub type HarmonizeResult<T> = Result<T, HarmonizeError>;

/// Primary error type for harmonization stages.
///
/// `field` strings are the `Display` form of a [`crate::FieldMeta`]
/// (`source/variable period`) so an operator can trace the offending record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarmonizeError {
    /// Remap input is malformed or cannot be aligned with the target grid.
    #[error("grid mismatch for {field}: {reason}")]
    GridMismatch { field: String, reason: String },

    /// A missing ocean cell has no donor within the maximum stencil radius.
    #[error(
        "unfillable ocean cell in {field} at time index {time_index}{} (row {row}, col {col}): \
         no valid ocean neighbour within radius {max_radius}",
        date_suffix(.date)
    )]
    UnfillableCell {
        field: String,
        time_index: usize,
        date: Option<NaiveDate>,
        row: usize,
        col: usize,
        max_radius: usize,
    },

    /// A field claimed to be filled still has a missing ocean cell.
    #[error("{field} has a missing ocean cell at time index {time_index} (row {row}, col {col})")]
    MissingOceanCell {
        field: String,
        time_index: usize,
        row: usize,
        col: usize,
    },

    /// The reference series has no sample for a calendar month.
    #[error("insufficient climatology data for {field}: no samples for month {month}")]
    InsufficientClimatologyData { field: String, month: u32 },

    /// Normalization statistics are ill-defined (constant field, no ocean cells, ...).
    #[error("degenerate normalization scale for {field}: {reason} (offset={offset}, scale={scale})")]
    DegenerateScale {
        field: String,
        offset: f64,
        scale: f64,
        reason: String,
    },

    /// Arrays that must be aligned have different shapes.
    #[error("shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// The ocean mask has no ocean cells, so a masked statistic is undefined.
    #[error("ocean mask contains no ocean cells")]
    EmptyMask,

    /// A mask array holds something other than 0/1.
    #[error("invalid ocean mask: {0}")]
    InvalidMask(String),

    /// A calendar month outside 1..=12 was requested.
    #[error("invalid calendar month {0}, expected 1..=12")]
    InvalidMonth(u32),
}

fn date_suffix(date: &Option<NaiveDate>) -> String {
    date.map(|d| format!(" ({d})")).unwrap_or_default()
}

impl HarmonizeError {
    /// Create a GridMismatch error.
    pub fn grid_mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GridMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(what: impl Into<String>, expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    /// Create a DegenerateScale error.
    pub fn degenerate_scale(
        field: impl Into<String>,
        offset: f64,
        scale: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self::DegenerateScale {
            field: field.into(),
            offset,
            scale,
            reason: reason.into(),
        }
    }

    /// Short stable identifier, used as a log field and metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GridMismatch { .. } => "grid_mismatch",
            Self::UnfillableCell { .. } => "unfillable_cell",
            Self::MissingOceanCell { .. } => "missing_ocean_cell",
            Self::InsufficientClimatologyData { .. } => "insufficient_climatology_data",
            Self::DegenerateScale { .. } => "degenerate_scale",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::EmptyMask => "empty_mask",
            Self::InvalidMask(_) => "invalid_mask",
            Self::InvalidMonth(_) => "invalid_month",
        }
    }
}
