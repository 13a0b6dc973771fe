//! Grid processing for the harmonization pipeline.
//!
//! Brings every source onto one target grid and closes the coastal gaps
//! that remapping leaves behind:
//!
//! ```text
//! RawField (native grid)
//!      │
//!      ▼
//! GridRemapper::remap        masked bilinear / nearest, parallel over time
//!      │
//!      ▼
//! RemappedField (target grid, NaN = missing)
//!      │
//!      ▼
//! GapFiller::fill            distance stencil over ocean donors
//!      │
//!      ▼
//! FilledField (every ocean cell finite)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{GapFiller, GridProcessorConfig, GridRemapper};
//!
//! let config = GridProcessorConfig::from_env();
//! let remapped = GridRemapper::from_config(&config).remap(&raw)?;
//! let filled = GapFiller::from_config(&config).fill(remapped, &mask)?;
//! ```

pub mod config;
pub mod fill;
pub mod remap;
pub mod types;

pub use config::{GridProcessorConfig, MAX_FILL_RADIUS_LIMIT};
pub use fill::{GapFiller, StencilOffset, StencilTable};
pub use remap::{bilinear_interpolate, nearest_interpolate, AxisLocator, Bracket, GridRemapper};
pub use types::{FillReport, InterpolationMethod};
