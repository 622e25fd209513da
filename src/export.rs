//! Album exporter
//!
//! Walks the catalog album by album and copies every image into
//! `output/<folder name>/<file name>`:
//! - Albums whose folder name does not match the filter are skipped
//! - Images whose copy is already up to date are skipped
//! - A failing image or album is reported and the run continues

use crate::catalog::{Album, CatalogIndex};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::naming::AlbumNamer;
use crate::report::{ExportEvent, Reporter};
use filetime::FileTime;
use regex::Regex;
use std::ffi::OsString;
use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, warn};

/// Buffer size for file copies
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// What happened to a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The image was copied
    Copied,
    /// The target already holds a current copy
    UpToDate,
    /// Dry run - would have copied
    WouldCopy,
}

/// Export counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub albums_exported: usize,
    pub albums_filtered: usize,
    pub albums_failed: usize,
    pub images_copied: usize,
    pub images_up_to_date: usize,
    pub images_would_copy: usize,
    pub images_failed: usize,
}

impl ExportStats {
    pub fn summary(&self) -> String {
        format!(
            "Albums: {} exported, {} filtered, {} failed; Images: {} copied, {} up to date, {} to copy, {} failed",
            self.albums_exported,
            self.albums_filtered,
            self.albums_failed,
            self.images_copied,
            self.images_up_to_date,
            self.images_would_copy,
            self.images_failed
        )
    }

    fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Copied => self.images_copied += 1,
            ImageOutcome::UpToDate => self.images_up_to_date += 1,
            ImageOutcome::WouldCopy => self.images_would_copy += 1,
        }
    }
}

/// An album or image that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Album name or image ID
    pub subject: String,
    pub message: String,
}

/// Result of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub stats: ExportStats,
    pub failures: Vec<Failure>,
}

impl ExportSummary {
    fn fail(&mut self, subject: impl Into<String>, error: &Error) {
        self.failures.push(Failure {
            subject: subject.into(),
            message: error.to_string(),
        });
    }
}

/// Exports catalog albums into the output directory
#[derive(Debug)]
pub struct Exporter {
    config: Config,
    filter: Regex,
    namer: AlbumNamer,
    output_dir: PathBuf,
}

impl Exporter {
    /// Create an exporter; fails when the album filter is not a valid regex
    pub fn new(config: Config) -> Result<Self> {
        let filter = Regex::new(&config.filter)?;
        let namer = AlbumNamer::new(config.include_date_prefix);
        let output_dir = config.resolved_output_dir();

        Ok(Self {
            config,
            filter,
            namer,
            output_dir,
        })
    }

    /// Load the configured catalog and export it
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<ExportSummary> {
        let catalog_path = self.config.resolved_catalog_path();
        reporter.report(&ExportEvent::CatalogLoading {
            path: &catalog_path,
        });

        let catalog = CatalogIndex::load(&catalog_path)?;
        Ok(self.export(&catalog, reporter))
    }

    /// Export every album of `catalog` that passes the filter
    pub fn export(&self, catalog: &CatalogIndex, reporter: &mut dyn Reporter) -> ExportSummary {
        let _span = span!(Level::INFO, "export", output = %self.output_dir.display()).entered();
        info!(
            filter = %self.filter,
            dry_run = self.config.dry_run,
            date_prefix = self.config.include_date_prefix,
            "Exporting albums"
        );

        let mut summary = ExportSummary::default();
        for album in catalog.albums() {
            self.export_album(catalog, &album, &mut summary, reporter);
        }

        info!(stats = %summary.stats.summary(), "Export finished");
        summary
    }

    fn export_album(
        &self,
        catalog: &CatalogIndex,
        album: &Album<'_>,
        summary: &mut ExportSummary,
        reporter: &mut dyn Reporter,
    ) {
        let label = album
            .name()
            .map(str::to_string)
            .unwrap_or_else(|_| format!("#{}", album.position() + 1));

        let name = match self.namer.name_for(catalog, album) {
            Ok(name) => name,
            Err(e) => {
                self.fail_album(&label, &e, summary, reporter);
                return;
            }
        };

        if let Some(date) = name.date_prefix {
            reporter.report(&ExportEvent::DatePrefixAdded {
                raw: &name.raw,
                date,
            });
        }

        if !self.filter.is_match(&name.folder) {
            debug!(folder = %name.folder, "Album does not match the filter");
            summary.stats.albums_filtered += 1;
            reporter.report(&ExportEvent::AlbumFiltered {
                folder: &name.folder,
                filter: self.filter.as_str(),
            });
            return;
        }

        let image_ids = match catalog.images_of(album) {
            Ok(ids) => ids,
            Err(e) => {
                self.fail_album(&label, &e, summary, reporter);
                return;
            }
        };

        let _span = span!(Level::INFO, "album", folder = %name.folder).entered();
        info!(images = image_ids.len(), "Processing roll");
        summary.stats.albums_exported += 1;
        reporter.report(&ExportEvent::AlbumStarted {
            folder: &name.folder,
        });

        let album_dir = self.output_dir.join(&name.folder);
        for image_id in image_ids {
            match self.export_image(catalog, image_id, &album_dir) {
                Ok((outcome, source, target)) => {
                    summary.stats.record(outcome);
                    let event = match outcome {
                        ImageOutcome::Copied => ExportEvent::ImageCopied {
                            source: &source,
                            target: &target,
                        },
                        ImageOutcome::WouldCopy => ExportEvent::ImageWouldCopy {
                            source: &source,
                            target: &target,
                        },
                        ImageOutcome::UpToDate => ExportEvent::ImageUpToDate { target: &target },
                    };
                    reporter.report(&event);
                }
                Err(e) => {
                    warn!(image_id, error = %e, "Failed to export image");
                    summary.stats.images_failed += 1;
                    summary.fail(image_id, &e);
                    reporter.report(&ExportEvent::ImageFailed {
                        image_id,
                        error: &e,
                    });
                }
            }
        }
    }

    fn fail_album(
        &self,
        label: &str,
        error: &Error,
        summary: &mut ExportSummary,
        reporter: &mut dyn Reporter,
    ) {
        warn!(album = label, error = %error, "Skipping malformed roll");
        summary.stats.albums_failed += 1;
        summary.fail(label, error);
        reporter.report(&ExportEvent::AlbumFailed {
            album: label,
            error,
        });
    }

    /// Copy one image into `album_dir` unless its copy is current
    fn export_image(
        &self,
        catalog: &CatalogIndex,
        image_id: &str,
        album_dir: &Path,
    ) -> Result<(ImageOutcome, PathBuf, PathBuf)> {
        let record = catalog.image_info(image_id)?;
        let source = record.image_path()?;
        let file_name = source.file_name().ok_or_else(|| Error::MissingImagePath {
            image_id: image_id.to_string(),
        })?;
        let target = album_dir.join(file_name);

        if !self.config.dry_run {
            fs::create_dir_all(album_dir)?;
        }

        let source_meta = fs::metadata(source)?;
        if is_up_to_date(&source_meta, &target)? {
            debug!(?target, "Already up to date");
            return Ok((ImageOutcome::UpToDate, source.to_path_buf(), target));
        }

        if self.config.dry_run {
            return Ok((ImageOutcome::WouldCopy, source.to_path_buf(), target));
        }

        copy_preserving(source, &source_meta, &target).map_err(|e| Error::CopyFailed {
            source_path: source.to_path_buf(),
            target: target.clone(),
            source: e,
        })?;
        debug!(?source, ?target, "Copied image");

        Ok((ImageOutcome::Copied, source.to_path_buf(), target))
    }
}

/// Whether `target` already holds a complete copy at least as new as the
/// source. When either modification time has no sub-second part the
/// comparison falls back to whole seconds.
pub fn is_up_to_date(source_meta: &Metadata, target: &Path) -> io::Result<bool> {
    let target_meta = match fs::metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if !target_meta.is_file() || target_meta.len() != source_meta.len() {
        return Ok(false);
    }

    let source_mtime = FileTime::from_last_modification_time(source_meta);
    let target_mtime = FileTime::from_last_modification_time(&target_meta);
    if source_mtime.nanoseconds() == 0 || target_mtime.nanoseconds() == 0 {
        return Ok(target_mtime.unix_seconds() >= source_mtime.unix_seconds());
    }
    Ok(target_mtime >= source_mtime)
}

/// Copy `source` to `target`, keeping the source's timestamps and
/// permission bits. The data goes to a sibling `.partial` file first, so an
/// existing target is only replaced once the new copy is complete.
fn copy_preserving(source: &Path, source_meta: &Metadata, target: &Path) -> io::Result<()> {
    let src_file = File::open(source)?;
    let partial = partial_path(target);
    // Left over from an interrupted run, possibly read-only
    if partial.is_file() {
        fs::remove_file(&partial)?;
    }

    let written = copy_file(src_file, &partial).and_then(|()| {
        filetime::set_file_times(
            &partial,
            FileTime::from_last_access_time(source_meta),
            FileTime::from_last_modification_time(source_meta),
        )?;
        fs::set_permissions(&partial, source_meta.permissions())
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    // A previous copy may carry read-only permissions
    if target.is_file() {
        fs::remove_file(target)?;
    }
    fs::rename(&partial, target)
}

/// Hidden sibling of `target` that holds a copy in progress
fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(".partial");
    target.with_file_name(name)
}

/// Copy an open file to `dest` with buffered I/O
fn copy_file(src_file: File, dest: &Path) -> io::Result<()> {
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, src_file);
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, dest_file);

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
