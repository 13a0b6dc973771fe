//! Error types for artifact I/O.

use ocean_common::HarmonizeError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using ArtifactError.
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Errors that can occur while reading or writing artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid JSON document of the expected kind.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Directory traversal failed.
    #[error("failed to scan directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A named array is not present in the file.
    #[error("array '{0}' not found in artifact")]
    MissingArray(String),

    /// An array does not have the shape its name requires.
    #[error("array '{name}' has invalid shape {found:?}: {reason}")]
    InvalidShape {
        name: String,
        found: Vec<usize>,
        reason: String,
    },

    /// Document fields are inconsistent.
    #[error("invalid artifact document: {0}")]
    InvalidDocument(String),

    /// Data failed a pipeline invariant while being converted.
    #[error(transparent)]
    Harmonize(#[from] HarmonizeError),
}

impl ArtifactError {
    /// Create an Io error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a Json error.
    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an InvalidShape error.
    pub fn invalid_shape(name: impl Into<String>, found: &[usize], reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            name: name.into(),
            found: found.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidDocument error.
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}
