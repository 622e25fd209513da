//! Configuration types for the exporter

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where iPhoto keeps its catalog
pub const DEFAULT_CATALOG_PATH: &str = "~/Pictures/iPhoto Library/AlbumData.xml";

/// Where exported albums go unless told otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "~/Desktop/GoogleDrive/pics";

/// Album filter matching every album
pub const DEFAULT_FILTER: &str = ".*";

/// Configuration for an export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// iPhoto `AlbumData.xml` file to read
    pub catalog_path: PathBuf,

    /// Directory the album folders are created in
    pub output_dir: PathBuf,

    /// Regex; only albums whose folder name matches are exported
    pub filter: String,

    /// Prepend the first photo's date to album names lacking one
    pub include_date_prefix: bool,

    /// Report what would be copied without touching the disk
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            filter: DEFAULT_FILTER.to_string(),
            include_date_prefix: true,
            dry_run: false,
            verbose: false,
        }
    }
}

/// Replace a leading `~` with the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl Config {
    /// Catalog path with `~` expanded
    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_home(&self.catalog_path)
    }

    /// Output directory with `~` expanded
    pub fn resolved_output_dir(&self) -> PathBuf {
        expand_home(&self.output_dir)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample settings file
    pub fn sample_config() -> String {
        r#"# iPhoto Backup settings
# This file uses TOML format (https://toml.io)
# Command line flags override every value here.

# iPhoto catalog to read
catalog_path = "~/Pictures/iPhoto Library/AlbumData.xml"

# Directory the album folders are created in
output_dir = "~/Desktop/GoogleDrive/pics"

# Only export albums whose folder name matches this regex
# Examples:
#   - "Summer"       - any album with "Summer" in its name
#   - "^2013-"       - albums from 2013 (after date prefixing)
filter = ".*"

# Prepend the date of the album's first photo (YYYY-MM-DD) to album
# names that do not already start with one
include_date_prefix = true

# Dry run mode - show what would be copied without copying
dry_run = false

# Verbose output - show debug logging
verbose = false
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}", path = .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}", path = .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{path}': {source}", path = .path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {source}")]
    SerializeError { source: toml::ser::Error },
}
