//! Error types for the iPhoto exporter

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the exporter
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read catalog {path}: {source}")]
    CatalogLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {message}")]
    CatalogParse { path: PathBuf, message: String },

    #[error("Key not found in dictionary: {key:?}")]
    KeyNotFound { key: String },

    #[error("Key {key:?} has no value element following it")]
    MalformedPair { key: String },

    #[error("Value for {key:?} is <{found}>, expected <{expected}>")]
    UnexpectedNode {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("Image {image_id} not found in Master Image List")]
    ImageNotFound { image_id: String },

    #[error("Image {image_id} has no ImagePath")]
    MissingImagePath { image_id: String },

    #[error("Image {image_id} has an invalid DateAsTimerInterval: {value:?}")]
    InvalidTimestamp { image_id: String, value: String },

    #[error("Failed to copy {source_path} to {target}: {source}")]
    CopyFailed {
        source_path: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid album filter: {0}")]
    Regex(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the error describes a broken catalog structure rather than a
    /// problem with a single image or file.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::CatalogLoad { .. }
                | Error::CatalogParse { .. }
                | Error::KeyNotFound { .. }
                | Error::MalformedPair { .. }
                | Error::UnexpectedNode { .. }
        )
    }
}
