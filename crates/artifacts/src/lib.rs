//! Artifact files exchanged with the training side.
//!
//! - [`ArtifactFile`]: named arrays (`cmip6_ad_sten`, `oras5_ad_sten`,
//!   `oras5_mclim`, `mask1`) with dates and a metadata header
//! - [`RawArtifact`]: native-grid input records
//! - [`DataLayout`]: where each file lives and what it is called
//!
//! Everything is JSON. Missing values are written as `null`.

pub mod array;
pub mod container;
pub mod error;
pub mod layout;
pub mod raw;

pub use array::StoredArray;
pub use container::{ArtifactFile, ArtifactHeader, CLIMATOLOGY_ARRAY, MASK_ARRAY, SERIES_SUFFIX};
pub use error::{ArtifactError, Result};
pub use layout::{source_stem, ArtifactKind, DataLayout, DiscoveredArtifact};
pub use raw::RawArtifact;

use calibration::NormalizationParams;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write normalization parameters as a standalone JSON document.
pub fn save_norm_params(params: &NormalizationParams, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ArtifactError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, params).map_err(|e| ArtifactError::json(path, e))?;
    writer.flush().map_err(|e| ArtifactError::io(path, e))
}

/// Read normalization parameters, rejecting unusable ones.
pub fn load_norm_params(path: impl AsRef<Path>) -> Result<NormalizationParams> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
    let params: NormalizationParams = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ArtifactError::json(path, e))?;
    params.validate()?;
    Ok(params)
}
