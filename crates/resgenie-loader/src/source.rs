//! Reading resume documents from disk into a generic value tree.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Serialization format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => Err(SourceError::UnsupportedExtension {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path} has no recognised extension (expected .yaml, .yml or .json)")]
    UnsupportedExtension { path: PathBuf },
}

/// Parse document text in the given format.
pub fn parse_document(contents: &str, format: DocumentFormat) -> Result<Value, SourceError> {
    let value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(contents)?,
        DocumentFormat::Json => serde_json::from_str::<Value>(contents)?,
    };
    Ok(value)
}

/// Read and parse the document at `path`, inferring the format from its extension.
pub fn read_document(path: &Path) -> Result<Value, SourceError> {
    let format = DocumentFormat::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), ?format, bytes = contents.len(), "read resume document");
    parse_document(&contents, format)
}
