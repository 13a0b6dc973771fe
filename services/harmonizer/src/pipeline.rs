//! Batch preparation of training artifacts.
//!
//! ```text
//! oras5 raw ──remap──► mask ──fill──► Calibration ──► climatology, norm params,
//!                                          │           oras5 filled (training years)
//!                                          ▼
//! cmip6 raw (per member, in parallel) ──remap──fill──normalize──► filled + normalized
//! ```
//!
//! The reference must succeed for anything to be written. A failing model
//! record is logged and reported; the other records still complete.

use anyhow::{Context, Result};
use artifacts::{save_norm_params, ArtifactFile, DataLayout, RawArtifact};
use calibration::Calibration;
use grid_processor::{FillReport, GapFiller, GridRemapper};
use ocean_common::{FilledField, GriddedSeries, OceanMask, RawField, RemappedField, Source, Variable};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::HarmonizerConfig;

/// Files written for one model record.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    pub filled_path: PathBuf,
    pub normalized_path: PathBuf,
    pub cells_filled: usize,
}

/// Outcome of one model record.
#[derive(Debug)]
pub struct RecordOutcome {
    pub source: Source,
    pub result: Result<PreparedRecord>,
}

/// Everything `prepare` produced for one variable.
#[derive(Debug)]
pub struct PrepareSummary {
    pub variable: Variable,
    pub climatology_path: PathBuf,
    pub reference_path: PathBuf,
    pub norm_params_path: PathBuf,
    pub records: Vec<RecordOutcome>,
}

impl PrepareSummary {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Remap, fill, calibrate and write artifacts for one configuration.
pub struct Harmonizer {
    config: HarmonizerConfig,
    layout: DataLayout,
    remapper: GridRemapper,
    filler: GapFiller,
}

impl Harmonizer {
    pub fn new(config: HarmonizerConfig) -> Result<Self> {
        config.validate()?;
        let layout = config.layout();
        let remapper = GridRemapper::from_config(&config.processing);
        let filler = GapFiller::from_config(&config.processing);
        Ok(Self {
            config,
            layout,
            remapper,
            filler,
        })
    }

    pub fn config(&self) -> &HarmonizerConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Remap a raw record onto the target grid and fill its coastal gaps.
    pub fn harmonize(&self, raw: &RawField, mask: &OceanMask) -> Result<(FilledField, FillReport)> {
        let remapped = self.remapper.remap(raw)?;
        Ok(self.filler.fill_with_report(remapped, mask)?)
    }

    /// The run's ocean mask: the configured `mask_file`, else the `mask1` of
    /// the variable's climatology artifact, else the valid cells of the first
    /// remapped reference step.
    fn resolve_mask(&self, variable: Variable, remapped_reference: &RemappedField) -> Result<OceanMask> {
        let climatology_path = self
            .layout
            .climatology_path(variable, self.config.climatology_period);
        let path = match &self.config.mask_file {
            Some(path) => Some(path.clone()),
            None if climatology_path.is_file() => Some(climatology_path),
            None => None,
        };

        let mask = match path {
            Some(path) => {
                let mask = ArtifactFile::load(&path)
                    .and_then(|file| file.mask())
                    .with_context(|| format!("Failed to read mask1 from {:?}", path))?;
                debug!(path = %path.display(), ocean_cells = mask.ocean_count(), "Loaded mask1");
                mask
            }
            None => {
                let series = remapped_reference.series();
                anyhow::ensure!(series.n_times() > 0, "Reference record has no time steps");
                let mask = OceanMask::from_valid_cells(series.step(0));
                warn!(
                    variable = %variable,
                    ocean_cells = mask.ocean_count(),
                    "No mask1 available, deriving ocean mask from the reference; its gaps become land"
                );
                mask
            }
        };
        mask.ensure_matches(self.remapper.grid())?;
        Ok(mask)
    }

    /// Run the calibration phase on the reanalysis record.
    ///
    /// Returns the calibration and the filled reference over the whole
    /// climatology period.
    pub fn calibrate(&self, variable: Variable) -> Result<(Calibration, FilledField)> {
        let path = self
            .layout
            .raw_path(variable, &Source::Oras5, self.config.climatology_period);
        let raw = load_raw(&path, variable, &Source::Oras5)?;

        let remapped = self.remapper.remap(&raw)?;
        let mask = self.resolve_mask(variable, &remapped)?;
        let (filled, report) = self.filler.fill_with_report(remapped, &mask)?;
        debug!(
            variable = %variable,
            cells_filled = report.total_filled(),
            max_radius_used = report.max_radius_used,
            "Filled reference record"
        );

        let calibration = Calibration::from_reference(&filled, mask, self.config.normalization)?;
        Ok((calibration, filled))
    }

    /// Prepare every artifact for `variable`.
    ///
    /// Errors only when the reference cannot be processed or its artifacts
    /// cannot be written; model record failures are collected in the summary.
    pub fn prepare(&self, variable: Variable) -> Result<PrepareSummary> {
        self.layout.ensure_output_dirs(variable)?;
        let training = self.config.training_period;
        let (calibration, reference) = self.calibrate(variable)?;

        let climatology_path = self
            .layout
            .climatology_path(variable, self.config.climatology_period);
        let mut file = self.new_file(variable, &calibration)?;
        file.header.source = Some(Source::Oras5);
        file.insert_climatology(calibration.climatology())?;
        file.save(&climatology_path)?;

        let reference_path = self.layout.filled_path(variable, &Source::Oras5, training);
        let mut file = self.new_file(variable, &calibration)?;
        file.insert_series(reference.restrict_to(training).series())?;
        file.save(&reference_path)?;

        let norm_params_path = self.layout.norm_params_path(variable);
        save_norm_params(calibration.params(), &norm_params_path)?;

        info!(
            variable = %variable,
            climatology = %climatology_path.display(),
            reference = %reference_path.display(),
            "Wrote reference artifacts"
        );

        let records = self
            .config
            .model_sources()
            .into_par_iter()
            .map(|source| {
                let result = self.prepare_record(variable, &source, &calibration);
                match &result {
                    Ok(record) => {
                        metrics::counter!("harmonizer_records_processed_total").increment(1);
                        info!(
                            variable = %variable,
                            source = %source,
                            cells_filled = record.cells_filled,
                            path = %record.filled_path.display(),
                            "Prepared model record"
                        );
                    }
                    Err(e) => {
                        metrics::counter!("harmonizer_records_failed_total").increment(1);
                        let message = format!("{:#}", e);
                        error!(
                            variable = %variable,
                            source = %source,
                            error = %message,
                            "Model record failed"
                        );
                    }
                }
                RecordOutcome { source, result }
            })
            .collect();

        Ok(PrepareSummary {
            variable,
            climatology_path,
            reference_path,
            norm_params_path,
            records,
        })
    }

    fn prepare_record(
        &self,
        variable: Variable,
        source: &Source,
        calibration: &Calibration,
    ) -> Result<PreparedRecord> {
        let training = self.config.training_period;
        let raw = load_raw(&self.layout.raw_path(variable, source, training), variable, source)?;

        let (filled, report) = self
            .harmonize(&raw, calibration.mask())
            .with_context(|| format!("Failed to harmonize {}", raw.meta))?;
        let filled = filled.restrict_to(training);

        let filled_path = self.layout.filled_path(variable, source, training);
        let mut file = self.new_file(variable, calibration)?;
        file.insert_series(filled.series())?;
        file.save(&filled_path)?;

        let tensor = calibration.normalize(&filled);
        let values = tensor.training_array(calibration.mask(), self.config.land_value)?;
        let normalized = GriddedSeries::new(
            tensor.meta().clone(),
            tensor.dates().to_vec(),
            values.mapv(f64::from),
        )?;
        let normalized_path = self.layout.normalized_path(variable, source, training);
        let mut file = self.new_file(variable, calibration)?;
        file.header.normalization = Some(tensor.params().clone());
        file.insert_series(&normalized)?;
        file.save(&normalized_path)?;

        Ok(PreparedRecord {
            filled_path,
            normalized_path,
            cells_filled: report.total_filled(),
        })
    }

    /// Empty artifact on the target grid carrying the run's mask.
    fn new_file(&self, variable: Variable, calibration: &Calibration) -> Result<ArtifactFile> {
        let mut file = ArtifactFile::for_grid(variable, *self.remapper.grid());
        file.insert_mask(calibration.mask())?;
        Ok(file)
    }
}

/// Load a raw record and check it is the one its file name claims. The
/// record is labelled with the configured source, including its member.
fn load_raw(path: &Path, variable: Variable, source: &Source) -> Result<RawField> {
    let mut raw = RawArtifact::load(path)
        .with_context(|| format!("Failed to load {} input from {:?}", source, path))?;
    anyhow::ensure!(
        raw.meta.variable == variable,
        "{:?} holds {} data, expected {}",
        path,
        raw.meta.variable,
        variable
    );
    anyhow::ensure!(
        raw.meta.source.prefix() == source.prefix(),
        "{:?} holds {} data, expected {}",
        path,
        raw.meta.source,
        source
    );
    raw.meta.source = source.clone();
    Ok(raw)
}
