//! iPhoto Backup - export iPhoto albums into a plain folder tree
//!
//! This library reads an iPhoto `AlbumData.xml` catalog and copies each
//! album into its own folder with support for:
//! - Key/value lookups over the catalog's property-list tree
//! - Album, image list and image record resolution
//! - ISO 8601 date prefixes taken from each album's first photo
//! - Regex album filtering
//! - Incremental copies that skip images already up to date

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod naming;
pub mod plist;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{Album, CatalogIndex, ImageRecord};
pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use export::{ExportStats, ExportSummary, Exporter, ImageOutcome};
pub use naming::{AlbumName, AlbumNamer};
pub use plist::{Document, Node, value_for_key};
pub use report::{ConsoleReporter, EventKind, ExportEvent, Reporter};
