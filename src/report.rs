//! Progress reporting
//!
//! The exporter describes what it does through [`ExportEvent`]s handed to a
//! [`Reporter`]. [`ConsoleReporter`] renders them for a terminal; tests
//! record them instead.

use crate::error::Error;
use crate::export::ExportSummary;
use chrono::NaiveDate;
use crossterm::{
    ExecutableCommand,
    style::{Color, Print, Stylize, style},
};
use std::fmt;
use std::io::{Write, stdout};
use std::path::Path;

/// Something worth telling the user about
#[derive(Debug)]
pub enum ExportEvent<'a> {
    CatalogLoading { path: &'a Path },
    DatePrefixAdded { raw: &'a str, date: NaiveDate },
    AlbumFiltered { folder: &'a str, filter: &'a str },
    AlbumStarted { folder: &'a str },
    AlbumFailed { album: &'a str, error: &'a Error },
    ImageCopied { source: &'a Path, target: &'a Path },
    ImageWouldCopy { source: &'a Path, target: &'a Path },
    ImageUpToDate { target: &'a Path },
    ImageFailed { image_id: &'a str, error: &'a Error },
    Finished { summary: &'a ExportSummary },
}

/// Discriminant of an [`ExportEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CatalogLoading,
    DatePrefixAdded,
    AlbumFiltered,
    AlbumStarted,
    AlbumFailed,
    ImageCopied,
    ImageWouldCopy,
    ImageUpToDate,
    ImageFailed,
    Finished,
}

impl ExportEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            ExportEvent::CatalogLoading { .. } => EventKind::CatalogLoading,
            ExportEvent::DatePrefixAdded { .. } => EventKind::DatePrefixAdded,
            ExportEvent::AlbumFiltered { .. } => EventKind::AlbumFiltered,
            ExportEvent::AlbumStarted { .. } => EventKind::AlbumStarted,
            ExportEvent::AlbumFailed { .. } => EventKind::AlbumFailed,
            ExportEvent::ImageCopied { .. } => EventKind::ImageCopied,
            ExportEvent::ImageWouldCopy { .. } => EventKind::ImageWouldCopy,
            ExportEvent::ImageUpToDate { .. } => EventKind::ImageUpToDate,
            ExportEvent::ImageFailed { .. } => EventKind::ImageFailed,
            ExportEvent::Finished { .. } => EventKind::Finished,
        }
    }
}

impl fmt::Display for ExportEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportEvent::CatalogLoading { path } => {
                write!(f, "Loading AlbumData: {}", path.display())
            }
            ExportEvent::DatePrefixAdded { raw, date } => write!(
                f,
                "Automatically adding {} prefix to folder: {}",
                date.format("%Y-%m-%d"),
                raw
            ),
            ExportEvent::AlbumFiltered { folder, filter } => {
                write!(f, "{} does not match the filter: /{}/", folder, filter)
            }
            ExportEvent::AlbumStarted { folder } => write!(f, "Processing Roll: {}...", folder),
            ExportEvent::AlbumFailed { album, error } => {
                write!(f, "Skipping roll {}: {}", album, error)
            }
            ExportEvent::ImageCopied { source, target } => write!(
                f,
                "copying {} to {}",
                source.display(),
                target.display()
            ),
            ExportEvent::ImageWouldCopy { source, target } => write!(
                f,
                "would copy {} to {}",
                source.display(),
                target.display()
            ),
            ExportEvent::ImageUpToDate { .. } => write!(f, "."),
            ExportEvent::ImageFailed { image_id, error } => {
                write!(f, "image {}: {}", image_id, error)
            }
            ExportEvent::Finished { summary } => write!(f, "{}", summary.stats.summary()),
        }
    }
}

/// Receives progress events from the exporter
pub trait Reporter {
    fn report(&mut self, event: &ExportEvent<'_>);
}

/// Console theme colors
pub struct CliTheme;

impl CliTheme {
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const HINT: Color = Color::DarkGrey;
    pub const ACCENT: Color = Color::Cyan;
}

/// Writes styled progress lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Up-to-date markers printed on the current line
    markers: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// End a run of `.` markers before printing a full line
    fn break_markers(&mut self) {
        if self.markers > 0 {
            let _ = stdout().execute(Print("\n"));
            self.markers = 0;
        }
    }

    fn line(&mut self, icon: &str, color: Color, text: &str) {
        self.break_markers();
        let mut out = stdout();
        let _ = out.execute(Print(style(icon).with(color).bold()));
        let _ = out.execute(Print(format!(" {}\n", text)));
    }

    fn print_summary(&mut self, summary: &ExportSummary) {
        self.break_markers();
        let stats = &summary.stats;
        let mut out = stdout();

        let _ = out.execute(Print(format!("\n{}\n", "─".repeat(60))));
        let _ = out.execute(Print(format!("{}\n", "Export complete".bold())));
        let _ = out.execute(Print(format!("{}\n", "─".repeat(60))));

        let rows = [
            ("Albums exported", stats.albums_exported, CliTheme::SUCCESS),
            ("Albums filtered", stats.albums_filtered, CliTheme::HINT),
            ("Albums failed", stats.albums_failed, CliTheme::ERROR),
            ("Images copied", stats.images_copied, CliTheme::SUCCESS),
            ("Images up to date", stats.images_up_to_date, CliTheme::ACCENT),
            ("Images to copy (dry run)", stats.images_would_copy, CliTheme::WARNING),
            ("Images failed", stats.images_failed, CliTheme::ERROR),
        ];
        for (key, value, color) in rows {
            let _ = out.execute(Print("  "));
            let _ = out.execute(Print(style(key).with(CliTheme::HINT)));
            let _ = out.execute(Print(": "));
            let _ = out.execute(Print(style(value.to_string()).with(color).bold()));
            let _ = out.execute(Print("\n"));
        }

        if !summary.failures.is_empty() {
            let _ = out.execute(Print("\n"));
            let _ = out.execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
            let _ = out.execute(Print(format!("{} failures\n", summary.failures.len())));
            for failure in &summary.failures {
                let _ = out.execute(Print("  "));
                let _ = out.execute(Print(style(&failure.subject).with(CliTheme::HINT)));
                let _ = out.execute(Print(": "));
                let _ = out.execute(Print(style(&failure.message).with(CliTheme::ERROR)));
                let _ = out.execute(Print("\n"));
            }
        }
        let _ = out.flush();
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: &ExportEvent<'_>) {
        let text = event.to_string();
        match event {
            ExportEvent::CatalogLoading { .. } => self.line("→", CliTheme::HINT, &text),
            ExportEvent::DatePrefixAdded { .. } => self.line("+", CliTheme::ACCENT, &text),
            ExportEvent::AlbumFiltered { .. } => {
                self.break_markers();
                let _ = stdout().execute(Print("\n"));
                self.line("⊘", CliTheme::WARNING, &text);
            }
            ExportEvent::AlbumStarted { .. } => {
                self.break_markers();
                let _ = stdout().execute(Print("\n"));
                self.line("▶", CliTheme::ACCENT, &text.bold().to_string());
            }
            ExportEvent::AlbumFailed { .. } => self.line("✗", CliTheme::ERROR, &text),
            ExportEvent::ImageCopied { .. } => self.line("  ✓", CliTheme::SUCCESS, &text),
            ExportEvent::ImageWouldCopy { .. } => self.line("  ~", CliTheme::ACCENT, &text),
            ExportEvent::ImageUpToDate { .. } => {
                self.markers += 1;
                let _ = stdout().execute(Print(style(text).with(CliTheme::HINT)));
            }
            ExportEvent::ImageFailed { .. } => self.line("  ✗", CliTheme::ERROR, &text),
            ExportEvent::Finished { summary } => self.print_summary(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_event_lines() {
        let source = PathBuf::from("/Masters/IMG_0001.jpg");
        let target = PathBuf::from("/backup/Summer Party/IMG_0001.jpg");

        let copied = ExportEvent::ImageCopied {
            source: &source,
            target: &target,
        };
        assert_eq!(copied.kind(), EventKind::ImageCopied);
        assert_eq!(
            copied.to_string(),
            "copying /Masters/IMG_0001.jpg to /backup/Summer Party/IMG_0001.jpg"
        );

        let marker = ExportEvent::ImageUpToDate { target: &target };
        assert_eq!(marker.to_string(), ".");

        let filtered = ExportEvent::AlbumFiltered {
            folder: "2013-10-10 Fall Supper",
            filter: "Summer",
        };
        assert_eq!(
            filtered.to_string(),
            "2013-10-10 Fall Supper does not match the filter: /Summer/"
        );
    }

    #[test]
    fn test_date_prefix_line() {
        let event = ExportEvent::DatePrefixAdded {
            raw: "Summer Party",
            date: NaiveDate::from_ymd_opt(2013, 10, 2).unwrap(),
        };
        assert_eq!(
            event.to_string(),
            "Automatically adding 2013-10-02 prefix to folder: Summer Party"
        );
    }

    #[test]
    fn test_failure_lines_carry_the_error() {
        let error = Error::ImageNotFound {
            image_id: "42".into(),
        };
        let event = ExportEvent::ImageFailed {
            image_id: "42",
            error: &error,
        };
        assert_eq!(event.kind(), EventKind::ImageFailed);
        assert!(event.to_string().contains("not found in Master Image List"));
    }
}
