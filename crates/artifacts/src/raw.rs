//! Native-grid input records.
//!
//! Raw records are produced by whatever extracted the model or reanalysis
//! output; the harmonizer only reads them. Coordinates stay on their native
//! axes and missing values may be `null` or the source's fill sentinel.

use crate::array::StoredArray;
use crate::error::{ArtifactError, Result};
use chrono::NaiveDate;
use ndarray::Ix3;
use ocean_common::{FieldMeta, RawField, Source, TimeRange, Variable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk form of a [`RawField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArtifact {
    pub source: Source,
    pub variable: Variable,
    /// Defaults to the years spanned by `dates`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<TimeRange>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub dates: Vec<NaiveDate>,
    pub data: StoredArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_value: Option<f64>,
}

impl RawArtifact {
    pub fn from_field(field: &RawField) -> Self {
        Self {
            source: field.meta.source.clone(),
            variable: field.meta.variable,
            period: Some(field.meta.period),
            lon: field.lon.clone(),
            lat: field.lat.clone(),
            dates: field.dates.clone(),
            data: StoredArray::from_view(field.data.view()),
            missing_value: field.missing_value,
        }
    }

    pub fn into_field(self) -> Result<RawField> {
        let data = self
            .data
            .to_array("data")?
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                ArtifactError::invalid_shape("data", self.data.shape(), "expected (time, lat, lon)")
            })?;
        let period = self
            .period
            .or_else(|| TimeRange::from_dates(&self.dates))
            .ok_or_else(|| ArtifactError::invalid_document("raw record has no dates"))?;

        Ok(RawField {
            meta: FieldMeta::new(self.source, self.variable, period),
            lon: self.lon,
            lat: self.lat,
            dates: self.dates,
            data,
            missing_value: self.missing_value,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<RawField> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
        let raw: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ArtifactError::json(path, e))?;
        raw.into_field()
    }

    pub fn save(field: &RawField, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ArtifactError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &Self::from_field(field))
            .map_err(|e| ArtifactError::json(path, e))?;
        writer.flush().map_err(|e| ArtifactError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{cmip6_meta, period, sample_raw_field, scratch_dir, SENTINEL};

    #[test]
    fn test_raw_record_on_disk() {
        let dir = scratch_dir();
        let path = dir.path().join("raw.json");
        let mut field = sample_raw_field(cmip6_meta(Some("r1i1p1f1"), Variable::Sss, period::single_year()), 0.2);
        field.data[[0, 0, 0]] = f64::NAN;

        RawArtifact::save(&field, &path).unwrap();
        let back = RawArtifact::load(&path).unwrap();

        assert_eq!(back.meta, field.meta);
        assert_eq!(back.lon, field.lon);
        assert_eq!(back.dates, field.dates);
        assert_eq!(back.missing_value, Some(SENTINEL));
        assert!(back.data[[0, 0, 0]].is_nan());
        assert_eq!(back.data[[1, 5, 5]], field.data[[1, 5, 5]]);
    }

    #[test]
    fn test_period_defaults_to_dates() {
        let json = r#"{
            "source": {"kind": "oras5"},
            "variable": "sss",
            "lon": [0.0, 1.0],
            "lat": [0.0],
            "dates": ["1999-01-15", "2001-06-15"],
            "data": {"shape": [2, 1, 2], "values": [1.0, 2.0, null, 4.0]}
        }"#;
        let raw: RawArtifact = serde_json::from_str(json).unwrap();
        let field = raw.into_field().unwrap();
        assert_eq!(field.meta.period, TimeRange::new(1999, 2001));
        assert!(field.data[[1, 0, 0]].is_nan());
        assert_eq!(field.missing_value, None);
    }

    #[test]
    fn test_rejects_two_dimensional_data() {
        let json = r#"{
            "source": {"kind": "cmip6"},
            "variable": "sss",
            "lon": [0.0, 1.0],
            "lat": [0.0],
            "dates": ["1999-01-15"],
            "data": {"shape": [1, 2], "values": [1.0, 2.0]}
        }"#;
        let raw: RawArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(raw.into_field(), Err(ArtifactError::InvalidShape { .. })));
    }
}
