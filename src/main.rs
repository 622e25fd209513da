//! iPhoto Backup - export iPhoto albums into plain folders
//!
//! Reads the iPhoto `AlbumData.xml` catalog and copies each album into a
//! folder of its own, skipping images whose copy is already up to date.

use anyhow::Result;
use clap::Parser;
use iphoto_backup::{Cli, Config, ConsoleReporter, ExportEvent, Exporter, Reporter};
use std::path::Path;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_sample_settings {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = load_config(&cli)?;

    if let Some(ref path) = cli.save_settings {
        config.save_to_file(path)?;
        println!("Settings saved to {}", path.display());
        return Ok(());
    }

    let guard = setup_logging(config.verbose, cli.log_file.as_deref(), cli.json_log)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "iPhoto Backup starting"
    );
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    validate_config(&config)?;

    let exporter = Exporter::new(config)?;
    let mut reporter = ConsoleReporter::new();

    match exporter.run(&mut reporter) {
        Ok(summary) => {
            reporter.report(&ExportEvent::Finished { summary: &summary });
            if let Some(path) = cli.log_file.as_deref() {
                info!(log_file = %path.display(), "Export complete. Log saved to");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Export failed");
            eprintln!("Error: {}", e);
            if e.is_structural() {
                eprintln!("The catalog could not be read as an iPhoto AlbumData.xml file.");
            }
            drop(guard);
            std::process::exit(1);
        }
    }
}

/// Load configuration from the settings file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.settings {
        Some(ref path) => cli.merge_with_config(Config::load_from_file(path)?),
        None => cli.to_config(),
    };
    Ok(config)
}

/// Refuse to export into the iPhoto library itself
fn validate_config(config: &Config) -> Result<()> {
    let catalog = config.resolved_catalog_path();
    let output = config.resolved_output_dir();

    if let Some(library) = catalog.parent()
        && is_library_bundle(library)
        && output.starts_with(library)
    {
        anyhow::bail!(
            "Output directory {} is inside the iPhoto library {}",
            output.display(),
            library.display()
        );
    }

    Ok(())
}

fn is_library_bundle(dir: &Path) -> bool {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name == "iphoto library" || name.ends_with(".photolibrary")
}

/// Setup logging: stderr, plus an optional log file
fn setup_logging(
    verbose: bool,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let console_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let Some(log_path) = log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let subscriber = tracing_subscriber::registry().with(console);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_filter(file_level),
            )
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_filter(file_level),
            )
            .init();
    }

    Ok(Some(guard))
}
