//! Masked comparison of two filled artifacts.

use anyhow::{Context, Result};
use artifacts::ArtifactFile;
use calibration::{masked_loss, MetricKind};
use ocean_common::OceanMask;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Result printed by `harmonizer score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub metric: MetricKind,
    pub value: f64,
    pub time_steps: usize,
    pub ocean_cells: usize,
}

/// Loss between the primary series of two artifacts over ocean cells.
///
/// `mask` overrides the target's own `mask1`; one of them must exist.
pub fn score_files(
    prediction: &Path,
    target: &Path,
    mask: Option<&OceanMask>,
    metric: MetricKind,
) -> Result<ScoreReport> {
    let prediction_file = ArtifactFile::load(prediction)
        .with_context(|| format!("Failed to load prediction {:?}", prediction))?;
    let target_file = ArtifactFile::load(target)
        .with_context(|| format!("Failed to load target {:?}", target))?;

    let owned_mask;
    let mask = match mask {
        Some(mask) => mask,
        None => {
            owned_mask = target_file
                .mask()
                .with_context(|| format!("Target {:?} has no usable mask1", target))?;
            &owned_mask
        }
    };

    let prediction_data = prediction_file.array(prediction_file.primary_series_name()?)?;
    let target_data = target_file.array(target_file.primary_series_name()?)?;
    let value = masked_loss(prediction_data.view(), target_data.view(), mask, metric)?;

    let time_steps = if target_data.ndim() == 3 { target_data.shape()[0] } else { 1 };
    debug!(
        prediction = %prediction.display(),
        target = %target.display(),
        metric = %metric,
        value,
        "Scored artifacts"
    );
    Ok(ScoreReport {
        metric,
        value,
        time_steps,
        ocean_cells: mask.ocean_count(),
    })
}
