//! On-disk naming convention for artifacts.
//!
//! ```text
//! <data_dir>/
//! ├── sss/
//! │   ├── cmip6_sss_1958_2014_raw.json
//! │   ├── cmip6_sss_1958_2014_fill_diststen.json
//! │   ├── oras5_sss_1958_2014_fill_diststen.json
//! │   └── oras5_historical_sss_1958_2020_mean.json
//! └── so/
//!     └── ... same with the so_200m token
//! <output_dir>/
//! ├── models/
//! ├── sss_norm_params.json
//! └── cmip6_sss_1958_2014_normalized.json
//! ```
//!
//! An ensemble member is folded into the source stem (`cmip6_r1i1p1f1_...`).

use crate::error::{ArtifactError, Result};
use ocean_common::{Source, TimeRange, Variable};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const FILLED_SUFFIX: &str = "_fill_diststen";
const CLIMATOLOGY_PREFIX: &str = "oras5_historical_";
const CLIMATOLOGY_SUFFIX: &str = "_mean";
const RAW_SUFFIX: &str = "_raw";
const NORMALIZED_SUFFIX: &str = "_normalized";
const NORM_PARAMS_SUFFIX: &str = "_norm_params";
const EXTENSION: &str = "json";

/// What an artifact file holds, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Raw,
    Filled,
    Climatology,
    Normalized,
    NormParams,
}

impl ArtifactKind {
    /// Classify a file stem (name without extension).
    fn classify(stem: &str) -> Option<(Self, &str)> {
        if let Some(rest) = stem.strip_suffix(CLIMATOLOGY_SUFFIX) {
            if rest.starts_with(CLIMATOLOGY_PREFIX) {
                return Some((Self::Climatology, rest));
            }
        }
        [
            (FILLED_SUFFIX, Self::Filled),
            (RAW_SUFFIX, Self::Raw),
            (NORMALIZED_SUFFIX, Self::Normalized),
            (NORM_PARAMS_SUFFIX, Self::NormParams),
        ]
        .into_iter()
        .find_map(|(suffix, kind)| stem.strip_suffix(suffix).map(|rest| (kind, rest)))
    }
}

/// An artifact found by [`DataLayout::discover`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Years parsed from the trailing `_{start}_{end}` of the name.
    pub period: Option<TimeRange>,
}

/// Stem identifying a source in file names.
pub fn source_stem(source: &Source) -> String {
    match source {
        Source::Cmip6 {
            member: Some(member),
        } => format!("{}_{}", source.prefix(), member),
        other => other.prefix().to_string(),
    }
}

/// Trailing `_{start}_{end}` year pair of a name.
fn parse_period(name: &str) -> Option<TimeRange> {
    let mut parts = name.rsplitn(3, '_');
    let end = parts.next()?.parse().ok()?;
    let start = parts.next()?.parse().ok()?;
    Some(TimeRange::new(start, end))
}

/// Paths of every artifact for one data root and output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn variable_dir(&self, variable: Variable) -> PathBuf {
        self.data_dir.join(variable.directory())
    }

    pub fn models_dir(&self) -> PathBuf {
        self.output_dir.join("models")
    }

    fn file_name(stem: &str, variable: Variable, period: TimeRange, suffix: &str) -> String {
        format!(
            "{}_{}_{}{}.{}",
            stem,
            variable.file_token(),
            period.file_label(),
            suffix,
            EXTENSION
        )
    }

    /// Gap-filled series on the target grid.
    pub fn filled_path(&self, variable: Variable, source: &Source, period: TimeRange) -> PathBuf {
        self.variable_dir(variable).join(Self::file_name(
            &source_stem(source),
            variable,
            period,
            FILLED_SUFFIX,
        ))
    }

    /// Reanalysis monthly climatology.
    pub fn climatology_path(&self, variable: Variable, period: TimeRange) -> PathBuf {
        self.variable_dir(variable).join(format!(
            "{}{}_{}{}.{}",
            CLIMATOLOGY_PREFIX,
            variable.file_token(),
            period.file_label(),
            CLIMATOLOGY_SUFFIX,
            EXTENSION
        ))
    }

    /// Native-grid input record.
    pub fn raw_path(&self, variable: Variable, source: &Source, period: TimeRange) -> PathBuf {
        self.variable_dir(variable).join(Self::file_name(
            &source_stem(source),
            variable,
            period,
            RAW_SUFFIX,
        ))
    }

    /// Normalized training tensor.
    pub fn normalized_path(&self, variable: Variable, source: &Source, period: TimeRange) -> PathBuf {
        self.output_dir.join(Self::file_name(
            &source_stem(source),
            variable,
            period,
            NORMALIZED_SUFFIX,
        ))
    }

    /// Normalization parameters for a variable.
    pub fn norm_params_path(&self, variable: Variable) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.{}",
            variable.file_token(),
            NORM_PARAMS_SUFFIX,
            EXTENSION
        ))
    }

    /// Files a training run cannot start without: one filled file per model
    /// source, the filled reference and the climatology.
    pub fn essential_files(
        &self,
        variable: Variable,
        models: &[Source],
        training: TimeRange,
        climatology: TimeRange,
    ) -> Vec<PathBuf> {
        models
            .iter()
            .map(|source| self.filled_path(variable, source, training))
            .chain([
                self.filled_path(variable, &Source::Oras5, training),
                self.climatology_path(variable, climatology),
            ])
            .collect()
    }

    /// Essential files that do not exist, in [`essential_files`](Self::essential_files) order.
    pub fn check_availability(
        &self,
        variable: Variable,
        models: &[Source],
        training: TimeRange,
        climatology: TimeRange,
    ) -> Vec<PathBuf> {
        let missing: Vec<PathBuf> = self
            .essential_files(variable, models, training, climatology)
            .into_iter()
            .filter(|path| !path.is_file())
            .collect();
        debug!(variable = %variable, missing = missing.len(), "Checked data availability");
        missing
    }

    /// Create the variable, output and models directories. Returns the ones
    /// that did not exist before.
    pub fn ensure_output_dirs(&self, variable: Variable) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in [
            self.variable_dir(variable),
            self.output_dir.clone(),
            self.models_dir(),
        ] {
            if dir.is_dir() {
                continue;
            }
            std::fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;
            info!(path = %dir.display(), "Created directory");
            created.push(dir);
        }
        Ok(created)
    }

    /// Every recognizable artifact under the variable directory, sorted by path.
    pub fn discover(&self, variable: Variable) -> Result<Vec<DiscoveredArtifact>> {
        let root = self.variable_dir(variable);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some((kind, rest)) = ArtifactKind::classify(stem) {
                found.push(DiscoveredArtifact {
                    path: path.to_path_buf(),
                    kind,
                    period: parse_period(rest),
                });
            }
        }

        debug!(path = %root.display(), count = found.len(), "Discovered artifacts");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> DataLayout {
        DataLayout::new("/data", "/out")
    }

    #[test]
    fn test_file_names() {
        let layout = layout();
        let training = TimeRange::new(1958, 2014);
        let cmip6 = Source::Cmip6 { member: None };

        assert_eq!(
            layout.filled_path(Variable::Sss, &cmip6, training),
            PathBuf::from("/data/sss/cmip6_sss_1958_2014_fill_diststen.json")
        );
        assert_eq!(
            layout.filled_path(Variable::S200mAvg, &Source::Oras5, training),
            PathBuf::from("/data/so/oras5_so_200m_1958_2014_fill_diststen.json")
        );
        assert_eq!(
            layout.climatology_path(Variable::S200mAvg, TimeRange::new(1958, 2020)),
            PathBuf::from("/data/so/oras5_historical_so_200m_1958_2020_mean.json")
        );
        assert_eq!(
            layout.raw_path(Variable::Sss, &Source::Oras5, training),
            PathBuf::from("/data/sss/oras5_sss_1958_2014_raw.json")
        );
        assert_eq!(
            layout.norm_params_path(Variable::S200mAvg),
            PathBuf::from("/out/so_200m_norm_params.json")
        );
        assert_eq!(layout.models_dir(), PathBuf::from("/out/models"));
    }

    #[test]
    fn test_member_in_stem() {
        let member = Source::Cmip6 {
            member: Some("r2i1p1f1".to_string()),
        };
        assert_eq!(source_stem(&member), "cmip6_r2i1p1f1");
        assert_eq!(
            layout().normalized_path(Variable::Sss, &member, TimeRange::new(1958, 2014)),
            PathBuf::from("/out/cmip6_r2i1p1f1_sss_1958_2014_normalized.json")
        );
    }

    #[test]
    fn test_essential_files_follow_members() {
        let training = TimeRange::new(1958, 2014);
        let climatology = TimeRange::new(1958, 2020);
        let members = [
            Source::Cmip6 {
                member: Some("r1i1p1f1".to_string()),
            },
            Source::Cmip6 {
                member: Some("r2i1p1f1".to_string()),
            },
        ];

        let files = layout().essential_files(Variable::Sss, &members, training, climatology);
        assert_eq!(
            files,
            vec![
                PathBuf::from("/data/sss/cmip6_r1i1p1f1_sss_1958_2014_fill_diststen.json"),
                PathBuf::from("/data/sss/cmip6_r2i1p1f1_sss_1958_2014_fill_diststen.json"),
                PathBuf::from("/data/sss/oras5_sss_1958_2014_fill_diststen.json"),
                PathBuf::from("/data/sss/oras5_historical_sss_1958_2020_mean.json"),
            ]
        );

        let single = [Source::Cmip6 { member: None }];
        let files = layout().essential_files(Variable::Sss, &single, training, climatology);
        assert_eq!(
            files[0],
            PathBuf::from("/data/sss/cmip6_sss_1958_2014_fill_diststen.json")
        );
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(
            ArtifactKind::classify("oras5_historical_sss_1958_2020_mean"),
            Some((ArtifactKind::Climatology, "oras5_historical_sss_1958_2020"))
        );
        assert_eq!(
            ArtifactKind::classify("cmip6_sss_1958_2014_fill_diststen").map(|(k, _)| k),
            Some(ArtifactKind::Filled)
        );
        assert_eq!(
            ArtifactKind::classify("sss_norm_params").map(|(k, _)| k),
            Some(ArtifactKind::NormParams)
        );
        assert_eq!(ArtifactKind::classify("notes_mean"), None);
        assert_eq!(ArtifactKind::classify("readme"), None);

        assert_eq!(parse_period("oras5_sss_1958_2014"), Some(TimeRange::new(1958, 2014)));
        assert_eq!(parse_period("sss"), None);
    }
}
