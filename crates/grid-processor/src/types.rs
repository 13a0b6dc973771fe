//! Core types for grid processing.

use serde::{Deserialize, Serialize};

/// Interpolation method for remapping native fields onto the target grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest valid bracketing node (preserves exact values).
    Nearest,
    /// Bilinear over the valid bracketing nodes, weights renormalised.
    #[default]
    Bilinear,
}

impl InterpolationMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            _ => Self::Bilinear,
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// Summary of a gap-fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Number of ocean cells filled at each time step.
    pub filled_per_step: Vec<usize>,
    /// Largest stencil radius that was needed (0 when nothing was filled).
    pub max_radius_used: usize,
}

impl FillReport {
    /// Total number of cells filled over the whole series.
    pub fn total_filled(&self) -> usize {
        self.filled_per_step.iter().sum()
    }

    /// Whether the pass left the field untouched.
    pub fn is_noop(&self) -> bool {
        self.total_filled() == 0
    }
}
