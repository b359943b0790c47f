//! Filter-set files.
//!
//! A filter set is stored as JSON (`.json`) or YAML (`.yaml`, `.yml`) in the
//! shape of [`FilterSetDef`].

use std::fs;
use std::path::{Path, PathBuf};

use structseek::{FilterError, FilterSet, FilterSetDef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterFileError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON filter set: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML filter set: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported filter file extension: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Invalid(#[from] FilterError),
}

/// Reads a filter-set definition without validating it.
pub fn read_definition(path: &Path) -> Result<FilterSetDef, FilterFileError> {
    let text = fs::read_to_string(path).map_err(|source| FilterFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(serde_json::from_str(&text)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
        _ => Err(FilterFileError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Reads and validates a filter set, optionally replacing its resource type.
pub fn load(path: &Path, resource_type: Option<&str>) -> Result<FilterSet, FilterFileError> {
    let mut def = read_definition(path)?;
    if let Some(resource_type) = resource_type {
        def.resource_type = resource_type.to_string();
    }
    Ok(FilterSet::compile(&def)?)
}
