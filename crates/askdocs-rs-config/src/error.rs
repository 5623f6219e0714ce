//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config layer from disk failed.
    #[error("failed to read config {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Resolving a path on disk failed.
    #[error("failed to resolve path: {0}")]
    Io(#[from] std::io::Error),
    /// Parsing JSON5 contents failed.
    #[error("failed to parse config {label}: {source}")]
    ParseFailed {
        label: String,
        #[source]
        source: json5::Error,
    },
    /// Converting the merged JSON value into the typed model failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Cross-field validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}
