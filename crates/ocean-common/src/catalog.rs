//! Supported variables and data sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An ocean variable the bias-correction model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    /// Sea surface salinity.
    Sss,
    /// Salinity averaged over the upper 200 m.
    #[serde(rename = "s200mavg")]
    S200mAvg,
}

impl Variable {
    /// Every supported variable, in display order.
    pub const ALL: [Variable; 2] = [Variable::Sss, Variable::S200mAvg];

    /// Short code used on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sss => "sss",
            Self::S200mAvg => "s200mavg",
        }
    }

    /// Token used inside artifact file names.
    pub fn file_token(&self) -> &'static str {
        match self {
            Self::Sss => "sss",
            Self::S200mAvg => "so_200m",
        }
    }

    /// Per-variable subdirectory of the data root.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Sss => "sss",
            Self::S200mAvg => "so",
        }
    }

    /// Human readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sss => "Sea Surface Salinity (SSS)",
            Self::S200mAvg => "Salinity at 200m depth (S200mavg)",
        }
    }

    /// Physical units of the stored values.
    pub fn units(&self) -> &'static str {
        "psu"
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sss" => Ok(Self::Sss),
            "s200mavg" | "so_200m" | "so" => Ok(Self::S200mAvg),
            other => Err(format!(
                "unknown variable '{}', expected one of: sss, s200mavg",
                other
            )),
        }
    }
}

/// Where a field came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    /// A CMIP6 climate-model projection, optionally a specific ensemble member.
    Cmip6 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        member: Option<String>,
    },
    /// The ORAS5 ocean reanalysis, used as ground truth.
    Oras5,
}

impl Source {
    /// Family prefix used in artifact and array names.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Cmip6 { .. } => "cmip6",
            Self::Oras5 => "oras5",
        }
    }

    /// Name of the filled time-series array inside an artifact file.
    pub fn series_array_name(&self) -> String {
        format!("{}_ad_sten", self.prefix())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cmip6 { member: Some(member) } => write!(f, "cmip6[{}]", member),
            other => f.write_str(other.prefix()),
        }
    }
}
