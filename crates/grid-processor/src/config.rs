//! Configuration for the grid processor.

use crate::types::InterpolationMethod;
use ocean_common::GridSpec;
use serde::{Deserialize, Serialize};

/// Largest stencil radius accepted by [`GridProcessorConfig::validate`].
pub const MAX_FILL_RADIUS_LIMIT: usize = 64;

/// Configuration for remapping and gap filling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Target grid every source is resampled onto.
    pub grid: GridSpec,

    /// Interpolation method for grid resampling.
    pub interpolation: InterpolationMethod,

    /// Maximum ring radius (in cells) searched by the distance-stencil fill.
    pub max_fill_radius: usize,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::regional_85(),
            interpolation: InterpolationMethod::Bilinear,
            max_fill_radius: 5,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("GRID_INTERPOLATION") {
            self.interpolation = InterpolationMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("GAP_FILL_MAX_RADIUS") {
            if let Ok(radius) = val.parse() {
                self.max_fill_radius = radius;
            }
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_fill_radius == 0 {
            return Err("max_fill_radius must be > 0".to_string());
        }

        if self.max_fill_radius > MAX_FILL_RADIUS_LIMIT {
            return Err(format!(
                "max_fill_radius must be <= {}",
                MAX_FILL_RADIUS_LIMIT
            ));
        }

        self.grid.validate().map_err(|e| e.to_string())?;

        Ok(())
    }
}
