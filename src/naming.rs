//! Export folder naming
//!
//! An album is exported to a folder named after its `RollName`. Unless the
//! name already starts with an ISO date (`2013-10-10 Fall Supper`), the date
//! of the album's first photo is prepended: `2013-10-02 Summer Party`.

use crate::catalog::{Album, CatalogIndex};
use crate::error::Result;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Leading `YYYY-MM-DD ` on an album name
static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();

fn date_prefix_pattern() -> &'static Regex {
    DATE_PREFIX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2} ").unwrap())
}

/// Whether `name` already starts with a `YYYY-MM-DD ` prefix
pub fn has_date_prefix(name: &str) -> bool {
    date_prefix_pattern().is_match(name)
}

/// The iPhoto epoch, 2001-01-01 00:00:00 in local time
pub fn epoch() -> Option<DateTime<Local>> {
    let midnight = NaiveDate::from_ymd_opt(2001, 1, 1)?.and_hms_opt(0, 0, 0)?;
    Local.from_local_datetime(&midnight).earliest()
}

/// Local calendar date of a `DateAsTimerInterval` value.
/// Fractional seconds are dropped.
pub fn date_from_timer_interval(seconds: f64) -> Option<NaiveDate> {
    let offset = TimeDelta::try_seconds(seconds.trunc() as i64)?;
    epoch()?
        .checked_add_signed(offset)
        .map(|instant| instant.date_naive())
}

/// Make `name` usable as a single path component under the output root
pub fn sanitize_folder_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Folder name computed for an album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumName {
    /// `RollName` as stored in the catalog
    pub raw: String,
    /// Folder name used for the export
    pub folder: String,
    /// Date prepended to the raw name, if any
    pub date_prefix: Option<NaiveDate>,
}

/// Derives export folder names from albums
#[derive(Debug, Clone, Copy)]
pub struct AlbumNamer {
    include_date_prefix: bool,
}

impl Default for AlbumNamer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AlbumNamer {
    pub fn new(include_date_prefix: bool) -> Self {
        Self {
            include_date_prefix,
        }
    }

    /// Compute the export folder name for `album`
    pub fn name_for(&self, catalog: &CatalogIndex, album: &Album<'_>) -> Result<AlbumName> {
        let raw = album.name()?;

        let date_prefix = if self.include_date_prefix && !has_date_prefix(raw) {
            first_image_date(catalog, album)?
        } else {
            None
        };

        let folder = match date_prefix {
            Some(date) => format!("{} {}", date.format("%Y-%m-%d"), raw),
            None => raw.to_string(),
        };

        Ok(AlbumName {
            raw: raw.to_string(),
            folder: sanitize_folder_name(&folder),
            date_prefix,
        })
    }
}

/// Date of the first image in `album` that has a usable timestamp
fn first_image_date(catalog: &CatalogIndex, album: &Album<'_>) -> Result<Option<NaiveDate>> {
    for image_id in catalog.images_of(album)? {
        let seconds = match catalog
            .image_info(image_id)
            .and_then(|record| record.timer_interval())
        {
            Ok(seconds) => seconds,
            Err(e) => {
                debug!(image_id, error = %e, "No date from image, trying the next one");
                continue;
            }
        };

        match date_from_timer_interval(seconds) {
            Some(date) => return Ok(Some(date)),
            None => debug!(image_id, seconds, "Timer interval out of range"),
        }
    }

    Ok(None)
}
