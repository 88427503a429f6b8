//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Errors raised while reading or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} must contain a top-level mapping", .path.display())]
    NotAMapping { path: PathBuf },

    /// A setting key was a sequence or mapping instead of a scalar.
    #[error("setting keys must be scalars, found {found}")]
    InvalidKey { found: String },

    #[error("missing required setting `{key}`")]
    Missing { key: String },

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: String, reason: String },

    #[error("configuration validation failed: {}", join_errors(.0))]
    Validation(Vec<ConfigError>),
}

impl ConfigError {
    pub(crate) fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a YAML configuration file into its top-level mapping.
///
/// An empty document is treated as an empty mapping.
pub fn read_config_file(path: &Path) -> Result<Mapping, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mapping(&content, path)
}

pub(crate) fn parse_mapping(content: &str, path: &Path) -> Result<Mapping, ConfigError> {
    if is_blank_document(content) {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// True when the document holds nothing but whitespace and comments.
pub(crate) fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}
