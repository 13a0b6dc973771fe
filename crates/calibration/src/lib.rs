//! Reference-derived statistics for the harmonization pipeline.
//!
//! Everything here is computed once from the reference (reanalysis) record
//! during a single calibration phase and then shared read-only:
//!
//! - [`ClimatologyExtractor`] / [`Climatology`]: per-calendar-month means
//! - [`NormalizationParams`]: the affine transform applied to every record
//! - [`masked_loss`] / [`MaskedMetric`]: ocean-only error metrics
//!
//! [`Calibration`] bundles the mask, the climatology and the normalization
//! parameters so workers can take one `&Calibration` (or an `Arc`) instead of
//! reaching for shared state.

pub mod climatology;
pub mod metric;
pub mod normalize;

pub use climatology::{Climatology, ClimatologyExtractor, MONTHS};
pub use metric::{masked_loss, MaskedMetric, MetricKind};
pub use normalize::{
    NormalizationMethod, NormalizationParams, NormalizedTensor, DEGENERATE_SCALE_EPSILON,
};

use ocean_common::{FilledField, HarmonizeResult, OceanMask};
use tracing::info;

/// Immutable statistics derived from the reference record.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    mask: OceanMask,
    climatology: Climatology,
    params: NormalizationParams,
}

impl Calibration {
    /// Run the calibration phase over the reference record.
    pub fn from_reference(
        reference: &FilledField,
        mask: OceanMask,
        method: NormalizationMethod,
    ) -> HarmonizeResult<Self> {
        let params = NormalizationParams::compute_from_reference(reference, &mask, method)?;
        let climatology = ClimatologyExtractor::extract_all(reference)?;

        info!(
            reference = %reference.series().meta(),
            ocean_cells = mask.ocean_count(),
            method = %method,
            offset = params.offset,
            scale = params.scale,
            "Calibration complete"
        );
        Ok(Self {
            mask,
            climatology,
            params,
        })
    }

    pub fn mask(&self) -> &OceanMask {
        &self.mask
    }

    pub fn climatology(&self) -> &Climatology {
        &self.climatology
    }

    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    /// Normalize any filled record with the reference parameters.
    pub fn normalize(&self, field: &FilledField) -> NormalizedTensor {
        self.params.normalize(field)
    }

    /// Ocean-only metric over this calibration's mask.
    pub fn metric(&self, kind: MetricKind) -> MaskedMetric<'_> {
        MaskedMetric::new(&self.mask, kind)
    }
}
