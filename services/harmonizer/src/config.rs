//! Harmonizer configuration.
//!
//! Loaded from a YAML file with `${VAR}` and `${VAR:-default}` substitution,
//! then adjusted by the grid processor's environment overrides:
//!
//! ```yaml
//! data_dir: ${HARMONIZER_DATA_DIR:-./data}
//! output_dir: ${HARMONIZER_OUTPUT_DIR:-./output}
//! training_period: { start_year: 1958, end_year: 2014 }
//! climatology_period: { start_year: 1958, end_year: 2020 }
//! members: [r1i1p1f1]
//! normalization: minmax
//! land_value: 0.0
//! processing:
//!   interpolation: bilinear
//!   max_fill_radius: 5
//! ```

use anyhow::{Context, Result};
use artifacts::DataLayout;
use calibration::{MetricKind, NormalizationMethod};
use grid_processor::GridProcessorConfig;
use ocean_common::{Source, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level harmonizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonizerConfig {
    /// Root holding the per-variable `sss/` and `so/` directories.
    pub data_dir: PathBuf,

    /// Root for normalized tensors, normalization parameters and models.
    pub output_dir: PathBuf,

    /// Years written to the training artifacts.
    pub training_period: TimeRange,

    /// Years of reanalysis used for the climatology and normalization.
    pub climatology_period: TimeRange,

    /// Artifact whose `mask1` defines ocean cells. Without it the `mask1` of
    /// an existing climatology artifact is used, and failing that the valid
    /// cells of the first remapped reference step.
    pub mask_file: Option<PathBuf>,

    /// CMIP6 ensemble members; empty means a single unlabelled record.
    pub members: Vec<String>,

    /// Normalization statistic.
    pub normalization: NormalizationMethod,

    /// Value written to land cells of the normalized training tensors.
    pub land_value: f32,

    /// Default metric for `score`.
    pub metric: MetricKind,

    /// Target grid, interpolation and fill radius.
    pub processing: GridProcessorConfig,
}

impl Default for HarmonizerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./output"),
            training_period: TimeRange::new(1958, 2014),
            climatology_period: TimeRange::new(1958, 2020),
            mask_file: None,
            members: Vec::new(),
            normalization: NormalizationMethod::MinMax,
            land_value: 0.0,
            metric: MetricKind::Mse,
            processing: GridProcessorConfig::default(),
        }
    }
}

impl HarmonizerConfig {
    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read harmonizer config from {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to load harmonizer config from {:?}", path))?;
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self =
            serde_yaml::from_str(&expanded).context("Failed to parse harmonizer config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for a run: the file if given, defaults otherwise, with
    /// `GRID_INTERPOLATION` / `GAP_FILL_MAX_RADIUS` applied on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.processing = config.processing.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.processing
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid processing config: {}", e))?;

        anyhow::ensure!(
            self.climatology_period.start_year <= self.training_period.start_year
                && self.training_period.end_year <= self.climatology_period.end_year,
            "Training period {} must lie within the climatology period {}",
            self.training_period,
            self.climatology_period
        );

        anyhow::ensure!(
            self.land_value.is_finite(),
            "land_value must be finite, got {}",
            self.land_value
        );

        let mut seen = HashSet::new();
        for member in &self.members {
            anyhow::ensure!(!member.trim().is_empty(), "Ensemble member names cannot be empty");
            anyhow::ensure!(
                !member.contains(['/', '\\']),
                "Ensemble member '{}' cannot contain path separators",
                member
            );
            anyhow::ensure!(seen.insert(member.as_str()), "Duplicate ensemble member '{}'", member);
        }

        Ok(())
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir, &self.output_dir)
    }

    /// Model records processed by `prepare`, one per configured member.
    pub fn model_sources(&self) -> Vec<Source> {
        if self.members.is_empty() {
            return vec![Source::Cmip6 { member: None }];
        }
        self.members
            .iter()
            .map(|member| Source::Cmip6 {
                member: Some(member.clone()),
            })
            .collect()
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

/// Resolve `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::InterpolationMethod;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("HARMONIZER_TEST_VAR", "test_value");
        let result = expand_env_vars("prefix_${HARMONIZER_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("HARMONIZER_NONEXISTENT_VAR");
        let result = expand_env_vars("value_${HARMONIZER_NONEXISTENT_VAR:-default}_end").unwrap();
        assert_eq!(result, "value_default_end");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("HARMONIZER_REQUIRED_VAR");
        assert!(expand_env_vars("${HARMONIZER_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_resolve_var_expr_override_default() {
        std::env::set_var("HARMONIZER_SET_VAR", "custom");
        assert_eq!(resolve_var_expr("HARMONIZER_SET_VAR:-default").unwrap(), "custom");

        std::env::set_var("HARMONIZER_EMPTY_VAR", "");
        assert_eq!(resolve_var_expr("HARMONIZER_EMPTY_VAR:-fallback").unwrap(), "fallback");
    }

    #[test]
    fn test_full_yaml() {
        std::env::set_var("HARMONIZER_TEST_DATA", "/srv/ocean");
        let yaml = r#"
data_dir: ${HARMONIZER_TEST_DATA}
output_dir: ${HARMONIZER_TEST_OUTPUT:-/srv/out}
training_period: { start_year: 1960, end_year: 2000 }
climatology_period: { start_year: 1958, end_year: 2020 }
members: [r1i1p1f1, r2i1p1f1]
normalization: zscore
metric: rmse
processing:
  interpolation: nearest
  max_fill_radius: 3
"#;
        let config = HarmonizerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/ocean"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.training_period, TimeRange::new(1960, 2000));
        assert_eq!(config.normalization, NormalizationMethod::ZScore);
        assert_eq!(config.metric, MetricKind::Rmse);
        assert_eq!(config.processing.interpolation, InterpolationMethod::Nearest);
        assert_eq!(config.processing.max_fill_radius, 3);
        assert_eq!(config.model_sources().len(), 2);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = HarmonizerConfig::from_yaml("{}").unwrap();
        assert_eq!(config.training_period, TimeRange::new(1958, 2014));
        assert_eq!(config.processing.max_fill_radius, 5);
        assert_eq!(config.land_value, 0.0);
        assert_eq!(config.model_sources(), vec![Source::Cmip6 { member: None }]);
    }

    #[test]
    fn test_validation() {
        let mut config = HarmonizerConfig::default();
        assert!(config.validate().is_ok());

        config.training_period = TimeRange::new(1950, 2014);
        assert!(config.validate().is_err());

        config = HarmonizerConfig::default();
        config.members = vec!["r1".to_string(), "r1".to_string()];
        assert!(config.validate().is_err());

        config.members = vec!["../escape".to_string()];
        assert!(config.validate().is_err());

        config = HarmonizerConfig::default();
        config.processing.max_fill_radius = 0;
        assert!(config.validate().is_err());

        config = HarmonizerConfig::default();
        config.land_value = f32::NAN;
        assert!(config.validate().is_err());

        assert!(HarmonizerConfig::from_yaml("unknown_key: 1").is_err());
    }
}
