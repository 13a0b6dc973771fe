//! Named-array artifact files.
//!
//! One file holds any of:
//!
//! | name            | shape               |
//! |-----------------|---------------------|
//! | `cmip6_ad_sten` | `(time, ny, nx)`    |
//! | `oras5_ad_sten` | `(time, ny, nx)`    |
//! | `oras5_mclim`   | `(12, ny, nx)`      |
//! | `mask1`         | `(ny, nx)`, 0 or 1  |
//!
//! plus one date per time step and a metadata header. Every spatial shape in
//! a file must agree with `mask1` (and with the header grid when present).

use crate::array::StoredArray;
use crate::error::{ArtifactError, Result};
use calibration::{Climatology, NormalizationParams, MONTHS};
use chrono::{DateTime, NaiveDate, Utc};
use ndarray::{ArrayD, ArrayView, Dimension, Ix2, Ix3};
use ocean_common::{
    FieldMeta, FilledField, GridSpec, GriddedSeries, OceanMask, Source, TimeRange, Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Name of the land/ocean mask array.
pub const MASK_ARRAY: &str = "mask1";

/// Name of the monthly climatology array.
pub const CLIMATOLOGY_ARRAY: &str = "oras5_mclim";

/// Suffix shared by the filled time-series arrays.
pub const SERIES_SUFFIX: &str = "_ad_sten";

/// Metadata stored alongside the arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub variable: Variable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSpec>,
    /// Parameters used when the arrays hold normalized values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationParams>,
    pub created_at: DateTime<Utc>,
    pub producer: String,
}

impl ArtifactHeader {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            source: None,
            period: None,
            grid: None,
            normalization: None,
            created_at: Utc::now(),
            producer: concat!("harmonizer ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A set of named arrays sharing one spatial grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub header: ArtifactHeader,
    #[serde(default)]
    dates: Vec<NaiveDate>,
    arrays: BTreeMap<String, StoredArray>,
}

impl ArtifactFile {
    pub fn new(header: ArtifactHeader) -> Self {
        Self {
            header,
            dates: Vec::new(),
            arrays: BTreeMap::new(),
        }
    }

    /// Empty file for `variable` on `grid`.
    pub fn for_grid(variable: Variable, grid: GridSpec) -> Self {
        let mut header = ArtifactHeader::new(variable);
        header.grid = Some(grid);
        Self::new(header)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Array names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Add or replace an array after checking its shape.
    pub fn insert_array<D: Dimension>(
        &mut self,
        name: impl Into<String>,
        data: ArrayView<'_, f64, D>,
    ) -> Result<()> {
        let name = name.into();
        let stored = StoredArray::from_view(data);
        self.check_shape(&name, &stored)?;
        self.arrays.insert(name, stored);
        Ok(())
    }

    /// Add a filled series under its source's array name and take its dates.
    pub fn insert_series(&mut self, series: &GriddedSeries) -> Result<()> {
        let name = series.meta().source.series_array_name();
        if !self.dates.is_empty() && self.dates != series.dates() {
            return Err(ArtifactError::invalid_shape(
                name,
                &[series.n_times()],
                format!("file already holds {} different dates", self.dates.len()),
            ));
        }

        let previous = std::mem::replace(&mut self.dates, series.dates().to_vec());
        if let Err(e) = self.insert_array(name, series.data()) {
            self.dates = previous;
            return Err(e);
        }
        self.header.source.get_or_insert_with(|| series.meta().source.clone());
        self.header.period.get_or_insert(series.meta().period);
        Ok(())
    }

    pub fn insert_mask(&mut self, mask: &OceanMask) -> Result<()> {
        self.insert_array(MASK_ARRAY, mask.to_mask1().view())
    }

    pub fn insert_climatology(&mut self, climatology: &Climatology) -> Result<()> {
        self.insert_array(CLIMATOLOGY_ARRAY, climatology.months())?;
        self.header.period.get_or_insert(climatology.meta().period);
        Ok(())
    }

    /// Decode a named array.
    pub fn array(&self, name: &str) -> Result<ArrayD<f64>> {
        self.arrays
            .get(name)
            .ok_or_else(|| ArtifactError::MissingArray(name.to_string()))?
            .to_array(name)
    }

    /// Name of the only `*_ad_sten` array in the file.
    pub fn primary_series_name(&self) -> Result<&str> {
        let mut names = self.names().filter(|n| n.ends_with(SERIES_SUFFIX));
        match (names.next(), names.next()) {
            (Some(name), None) => Ok(name),
            (None, _) => Err(ArtifactError::MissingArray(format!("*{}", SERIES_SUFFIX))),
            (Some(_), Some(_)) => Err(ArtifactError::invalid_document(
                "more than one time-series array, name one explicitly",
            )),
        }
    }

    /// The time series stored for `source`.
    pub fn series(&self, source: &Source) -> Result<GriddedSeries> {
        let name = source.series_array_name();
        let data = self
            .array(&name)?
            .into_dimensionality::<Ix3>()
            .map_err(|_| ArtifactError::invalid_shape(&name, &[], "expected (time, ny, nx)"))?;
        let meta = FieldMeta::new(source.clone(), self.header.variable, self.period()?);
        Ok(GriddedSeries::new(meta, self.dates.clone(), data)?)
    }

    /// The time series for `source`, checked to be filled over `mask`.
    pub fn filled_series(&self, source: &Source, mask: &OceanMask) -> Result<FilledField> {
        Ok(FilledField::try_new(self.series(source)?, mask)?)
    }

    pub fn mask(&self) -> Result<OceanMask> {
        let data = self
            .array(MASK_ARRAY)?
            .into_dimensionality::<Ix2>()
            .map_err(|_| ArtifactError::invalid_shape(MASK_ARRAY, &[], "expected (ny, nx)"))?;
        Ok(OceanMask::from_mask1(data.view())?)
    }

    /// The monthly climatology, attributed to the reanalysis.
    pub fn climatology(&self) -> Result<Climatology> {
        let data = self
            .array(CLIMATOLOGY_ARRAY)?
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                ArtifactError::invalid_shape(CLIMATOLOGY_ARRAY, &[], "expected (12, ny, nx)")
            })?;
        let meta = FieldMeta::new(Source::Oras5, self.header.variable, self.period()?);
        Ok(Climatology::new(meta, data)?)
    }

    fn period(&self) -> Result<TimeRange> {
        self.header
            .period
            .or_else(|| TimeRange::from_dates(&self.dates))
            .ok_or_else(|| ArtifactError::invalid_document("no period in header and no dates"))
    }

    /// Check every array against the naming rules and against each other.
    pub fn validate(&self) -> Result<()> {
        for (name, stored) in &self.arrays {
            self.check_shape(name, stored)?;
        }
        Ok(())
    }

    fn check_shape(&self, name: &str, stored: &StoredArray) -> Result<()> {
        let shape = stored.shape();
        if !stored.is_consistent() {
            return Err(ArtifactError::invalid_shape(
                name,
                shape,
                "value count does not match shape",
            ));
        }
        let Some(spatial) = stored.spatial_shape().filter(|_| stored.ndim() <= 3) else {
            return Err(ArtifactError::invalid_shape(name, shape, "expected a 2-D or 3-D array"));
        };

        if name == MASK_ARRAY && stored.ndim() != 2 {
            return Err(ArtifactError::invalid_shape(name, shape, "mask must be (ny, nx)"));
        }
        if name == CLIMATOLOGY_ARRAY && (stored.ndim() != 3 || shape[0] != MONTHS) {
            return Err(ArtifactError::invalid_shape(
                name,
                shape,
                "climatology must be (12, ny, nx)",
            ));
        }
        if name.ends_with(SERIES_SUFFIX) {
            if stored.ndim() != 3 {
                return Err(ArtifactError::invalid_shape(name, shape, "series must be (time, ny, nx)"));
            }
            if !self.dates.is_empty() && shape[0] != self.dates.len() {
                return Err(ArtifactError::invalid_shape(
                    name,
                    shape,
                    format!("{} dates for {} time steps", self.dates.len(), shape[0]),
                ));
            }
        }

        if let Some(grid) = &self.header.grid {
            if spatial != grid.shape() {
                return Err(ArtifactError::invalid_shape(
                    name,
                    shape,
                    format!("header grid is {:?}", grid.shape()),
                ));
            }
        }

        // Spatial agreement with the other arrays (with mask1 when present).
        let others = self
            .arrays
            .iter()
            .filter(|(other, _)| other.as_str() != name)
            .filter(|(other, _)| name == MASK_ARRAY || other.as_str() == MASK_ARRAY);
        for (other, other_stored) in others {
            if other_stored.spatial_shape() != Some(spatial) {
                return Err(ArtifactError::invalid_shape(
                    name,
                    shape,
                    format!("spatial shape differs from '{}' {:?}", other, other_stored.shape()),
                ));
            }
        }
        Ok(())
    }

    /// Write the file as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ArtifactError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| ArtifactError::json(path, e))?;
        writer.flush().map_err(|e| ArtifactError::io(path, e))?;

        debug!(
            path = %path.display(),
            arrays = ?self.arrays.keys().collect::<Vec<_>>(),
            "Wrote artifact"
        );
        Ok(())
    }

    /// Read and validate a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
        let artifact: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ArtifactError::json(path, e))?;
        artifact.validate()?;
        Ok(artifact)
    }
}
