//! Reference-derived affine normalization.
//!
//! `y = (x - offset) / scale`, with `offset` and `scale` computed once from
//! the reference (reanalysis) ocean cells and then applied unchanged to every
//! record of the run, so all sources share one numeric frame.

use ndarray::{Array, Array3, ArrayView, Axis, Dimension};
use ocean_common::{
    FieldMeta, FilledField, GriddedSeries, HarmonizeError, HarmonizeResult, NeumaierSum,
    OceanMask,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Relative threshold below which a scale is treated as zero.
pub const DEGENERATE_SCALE_EPSILON: f64 = 1e-12;

/// Statistic used to derive the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMethod {
    /// `offset = min`, `scale = max - min`; reference maps onto [0, 1].
    #[default]
    MinMax,
    /// `offset = mean`, `scale = population standard deviation`.
    ZScore,
}

impl NormalizationMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "minmax" => Some(Self::MinMax),
            "zscore" => Some(Self::ZScore),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinMax => write!(f, "minmax"),
            Self::ZScore => write!(f, "zscore"),
        }
    }
}

/// Affine transform parameters shared by every record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub method: NormalizationMethod,
    pub offset: f64,
    pub scale: f64,
    /// Record the statistics were computed from.
    pub reference: FieldMeta,
}

impl NormalizationParams {
    /// Build parameters, rejecting a degenerate scale.
    pub fn new(
        method: NormalizationMethod,
        offset: f64,
        scale: f64,
        reference: FieldMeta,
    ) -> HarmonizeResult<Self> {
        let params = Self {
            method,
            offset,
            scale,
            reference,
        };
        params.validate()?;
        Ok(params)
    }

    /// Compute the statistics over every ocean cell of every reference step.
    pub fn compute_from_reference(
        reference: &FilledField,
        mask: &OceanMask,
        method: NormalizationMethod,
    ) -> HarmonizeResult<Self> {
        let series = reference.series();
        let label = series.meta().to_string();
        mask.ensure_shape(&format!("reference {}", label), series.spatial_shape())?;

        if mask.ocean_count() == 0 {
            return Err(HarmonizeError::degenerate_scale(
                label,
                f64::NAN,
                f64::NAN,
                "mask has no ocean cells",
            ));
        }

        let data = series.data();
        let ocean_values = || {
            data.outer_iter().flat_map(move |step| {
                mask.ocean_cells()
                    .map(move |(row, col)| step[[row, col]])
                    .collect::<Vec<_>>()
            })
        };

        let (offset, scale) = match method {
            NormalizationMethod::MinMax => {
                let (min, max) = ocean_values().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), v| (lo.min(v), hi.max(v)),
                );
                (min, max - min)
            }
            NormalizationMethod::ZScore => {
                let sum: NeumaierSum = ocean_values().collect();
                let mean = sum.total() / sum.count() as f64;
                let squares: NeumaierSum = ocean_values().map(|v| (v - mean) * (v - mean)).collect();
                let variance = squares.total() / squares.count() as f64;
                (mean, variance.sqrt())
            }
        };

        let params = Self::new(method, offset, scale, series.meta().clone())?;
        debug!(
            reference = %label,
            method = %method,
            offset,
            scale,
            "Computed normalization parameters"
        );
        Ok(params)
    }

    /// Reject a zero, near-zero or non-finite scale.
    pub fn validate(&self) -> HarmonizeResult<()> {
        let label = self.reference.to_string();
        if !self.offset.is_finite() || !self.scale.is_finite() {
            return Err(HarmonizeError::degenerate_scale(
                label,
                self.offset,
                self.scale,
                "statistics are not finite",
            ));
        }
        if self.scale.abs() <= DEGENERATE_SCALE_EPSILON * self.offset.abs().max(1.0) {
            return Err(HarmonizeError::degenerate_scale(
                label,
                self.offset,
                self.scale,
                "reference field is constant over the ocean",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn normalize_value(&self, x: f64) -> f64 {
        (x - self.offset) / self.scale
    }

    #[inline]
    pub fn inverse_value(&self, y: f64) -> f64 {
        y * self.scale + self.offset
    }

    /// Normalize a filled field. Land cells go through the same map.
    pub fn normalize(&self, field: &FilledField) -> NormalizedTensor {
        let series = field.series();
        let mut data = series.data().to_owned();
        data.par_mapv_inplace(|x| self.normalize_value(x));

        debug!(
            field = %series.meta(),
            reference = %self.reference,
            steps = series.n_times(),
            "Normalized field"
        );
        NormalizedTensor {
            meta: series.meta().clone(),
            dates: series.dates().to_vec(),
            data,
            params: self.clone(),
        }
    }

    /// Map normalized values of any shape back to physical units.
    pub fn inverse_array<D: Dimension>(&self, data: ArrayView<'_, f64, D>) -> Array<f64, D> {
        data.mapv(|y| self.inverse_value(y))
    }
}

/// A filled field in normalized units, with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    meta: FieldMeta,
    dates: Vec<chrono::NaiveDate>,
    data: Array3<f64>,
    params: NormalizationParams,
}

impl NormalizedTensor {
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn dates(&self) -> &[chrono::NaiveDate] {
        &self.dates
    }

    /// Normalized values shaped `(time, ny, nx)`.
    pub fn data(&self) -> ndarray::ArrayView3<'_, f64> {
        self.data.view()
    }

    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    /// Recover the physical values.
    pub fn inverse(&self) -> HarmonizeResult<GriddedSeries> {
        GriddedSeries::new(
            self.meta.clone(),
            self.dates.clone(),
            self.params.inverse_array(self.data.view()),
        )
    }

    /// `f32` hand-off tensor with every land cell set to `land_value`.
    pub fn training_array(&self, mask: &OceanMask, land_value: f32) -> HarmonizeResult<Array3<f32>> {
        let (_, ny, nx) = self.data.dim();
        mask.ensure_shape(&format!("normalized {}", self.meta), (ny, nx))?;

        let mut out = self.data.mapv(|v| v as f32);
        for mut step in out.axis_iter_mut(Axis(0)) {
            for ((row, col), v) in step.indexed_iter_mut() {
                if !mask.is_ocean(row, col) {
                    *v = land_value;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ocean_common::time::monthly_dates;
    use ocean_common::Variable;
    use test_utils::{
        assert_approx_eq, create_coastal_mask, create_salinity_series, oras5_meta, period,
        poison_land,
    };

    fn reference(seed: u32) -> (FilledField, OceanMask) {
        let meta = oras5_meta(Variable::Sss, period::single_year());
        let dates = monthly_dates(meta.period);
        let series = create_salinity_series(meta, dates, 6, 7, seed);
        let mask = create_coastal_mask(6, 7, 3);
        let (meta, dates, mut data) = series.into_parts();
        poison_land(&mut data, &mask, f64::NAN);
        let series = GriddedSeries::new(meta, dates, data).unwrap();
        (FilledField::try_new(series, &mask).unwrap(), mask)
    }

    fn single_step(values: ndarray::Array2<f64>, mask: &OceanMask) -> FilledField {
        let meta = oras5_meta(Variable::Sss, period::single_year());
        let date = chrono::NaiveDate::from_ymd_opt(2000, 1, 15).unwrap();
        let series = GriddedSeries::new(meta, vec![date], values.insert_axis(Axis(0))).unwrap();
        FilledField::try_new(series, mask).unwrap()
    }

    #[test]
    fn test_minmax_ignores_land() {
        let mask = OceanMask::new(array![[true, false], [true, true]]);
        let field = single_step(array![[1.0, 1000.0], [3.0, 5.0]], &mask);
        let params =
            NormalizationParams::compute_from_reference(&field, &mask, NormalizationMethod::MinMax)
                .unwrap();
        assert_eq!(params.offset, 1.0);
        assert_eq!(params.scale, 4.0);

        let tensor = params.normalize(&field);
        assert_eq!(tensor.data()[[0, 1, 1]], 1.0);
        assert_eq!(tensor.data()[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_zscore_population_std() {
        let mask = OceanMask::all_ocean(1, 4);
        let field = single_step(array![[2.0, 4.0, 4.0, 6.0]], &mask);
        let params =
            NormalizationParams::compute_from_reference(&field, &mask, NormalizationMethod::ZScore)
                .unwrap();
        assert_approx_eq!(params.offset, 4.0, 1e-12);
        assert_approx_eq!(params.scale, 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for method in [NormalizationMethod::MinMax, NormalizationMethod::ZScore] {
            let (field, mask) = reference(7);
            let params = NormalizationParams::compute_from_reference(&field, &mask, method).unwrap();
            let restored = params.normalize(&field).inverse().unwrap();

            for ((idx, &x), &back) in field
                .series()
                .data()
                .indexed_iter()
                .zip(restored.data().iter())
            {
                if !mask.is_ocean(idx.1, idx.2) {
                    continue;
                }
                assert!((x - back).abs() < 1e-9 * params.scale, "{method} at {idx:?}");
            }
        }
    }

    #[test]
    fn test_model_uses_reference_parameters() {
        let (reference_field, mask) = reference(1);
        let (model_field, _) = reference(2);
        let params = NormalizationParams::compute_from_reference(
            &reference_field,
            &mask,
            NormalizationMethod::MinMax,
        )
        .unwrap();

        let tensor = params.normalize(&model_field);
        assert_eq!(tensor.params(), &params);
        let x = model_field.series().data()[[3, 4, 5]];
        assert_eq!(tensor.data()[[3, 4, 5]], (x - params.offset) / params.scale);
    }

    #[test]
    fn test_constant_reference_is_degenerate() {
        let mask = OceanMask::all_ocean(3, 3);
        let field = single_step(ndarray::Array2::from_elem((3, 3), 35.0), &mask);
        for method in [NormalizationMethod::MinMax, NormalizationMethod::ZScore] {
            let err = NormalizationParams::compute_from_reference(&field, &mask, method).unwrap_err();
            assert!(
                matches!(err, HarmonizeError::DegenerateScale { .. }),
                "{method}: {err:?}"
            );
        }
    }

    #[test]
    fn test_empty_mask_is_degenerate() {
        let mask = OceanMask::new(ndarray::Array2::from_elem((2, 2), false));
        let field = single_step(ndarray::Array2::from_elem((2, 2), f64::NAN), &mask);
        let err = NormalizationParams::compute_from_reference(
            &field,
            &mask,
            NormalizationMethod::MinMax,
        )
        .unwrap_err();
        assert!(matches!(err, HarmonizeError::DegenerateScale { .. }));
    }

    #[test]
    fn test_training_array_replaces_land() {
        let (field, mask) = reference(3);
        let params =
            NormalizationParams::compute_from_reference(&field, &mask, NormalizationMethod::MinMax)
                .unwrap();
        let out = params.normalize(&field).training_array(&mask, -1.0).unwrap();

        assert_eq!(out.dim(), (12, 6, 7));
        assert_eq!(out[[0, 0, 0]], -1.0);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(out
            .indexed_iter()
            .filter(|((_, r, c), _)| mask.is_ocean(*r, *c))
            .all(|(_, &v)| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_method_parsing_and_serde() {
        assert_eq!(NormalizationMethod::from_str("Min-Max"), Some(NormalizationMethod::MinMax));
        assert_eq!(NormalizationMethod::from_str("z_score"), Some(NormalizationMethod::ZScore));
        assert_eq!(NormalizationMethod::from_str("robust"), None);

        let (field, mask) = reference(5);
        let params =
            NormalizationParams::compute_from_reference(&field, &mask, NormalizationMethod::ZScore)
                .unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"zscore\""));
        let back: NormalizationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
