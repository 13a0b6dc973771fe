//! Common types and utilities shared across the ocean harmonization workspace.
//!
//! Everything in here is an immutable value: grids, masks and gridded series
//! are produced once and then passed by reference to every later stage.

pub mod bbox;
pub mod catalog;
pub mod error;
pub mod field;
pub mod grid;
pub mod mask;
pub mod numeric;
pub mod time;

pub use bbox::BoundingBox;
pub use catalog::{Source, Variable};
pub use error::{HarmonizeError, HarmonizeResult};
pub use field::{FieldMeta, FilledField, GriddedSeries, RawField, RemappedField};
pub use grid::GridSpec;
pub use mask::OceanMask;
pub use numeric::NeumaierSum;
pub use time::TimeRange;
