//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// iPhoto Backup - export iPhoto albums into plain folders
///
/// Copies every album ("roll") of an iPhoto library into its own folder
/// under the output directory. Folder names get the date of the album's
/// first photo as a `YYYY-MM-DD ` prefix unless they already carry one.
/// Images whose copy is already up to date are skipped.
#[derive(Parser, Debug)]
#[command(name = "iphoto-backup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only export albums whose folder name matches this regex [default: .*]
    #[arg(short = 'e', long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Directory to export albums to [default: ~/Desktop/GoogleDrive/pics]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// iPhoto AlbumData.xml file to process
    /// [default: ~/Pictures/iPhoto Library/AlbumData.xml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Automatically add an ISO 8601 date prefix to exported albums [default: true]
    #[arg(
        short = 'd',
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub include_date_prefix: Option<bool>,

    /// Keep album names exactly as they are in iPhoto
    #[arg(long, conflicts_with = "include_date_prefix")]
    pub no_include_date_prefix: bool,

    /// Settings file (TOML); command line flags take precedence
    #[arg(short = 'S', long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Dry run mode - show what would be copied without copying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Write the log file as JSON
    #[arg(long, requires = "log_file")]
    pub json_log: bool,

    /// Print a sample settings file and exit
    #[arg(long)]
    pub print_sample_settings: bool,

    /// Write the effective settings to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub save_settings: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref filter) = self.filter {
            config.filter = filter.clone();
        }
        if let Some(ref output) = self.output {
            config.output_dir = output.clone();
        }
        if let Some(ref catalog) = self.config {
            config.catalog_path = catalog.clone();
        }
        if let Some(include) = self.include_date_prefix {
            config.include_date_prefix = include;
        }
        if self.no_include_date_prefix {
            config.include_date_prefix = false;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no settings file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FILTER;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("iphoto-backup").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).to_config();
        assert_eq!(config, Config::default());
        assert_eq!(config.filter, DEFAULT_FILTER);
        assert!(config.include_date_prefix);
    }

    #[test]
    fn test_short_flags() {
        let config =
            parse(&["-e", "Summer", "-o", "/tmp/out", "-c", "/tmp/AlbumData.xml"]).to_config();
        assert_eq!(config.filter, "Summer");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/AlbumData.xml"));
    }

    #[test]
    fn test_date_prefix_flag_forms() {
        assert!(parse(&["-d"]).to_config().include_date_prefix);
        assert!(parse(&["--include-date-prefix", "true"]).to_config().include_date_prefix);
        assert!(!parse(&["--include-date-prefix", "false"]).to_config().include_date_prefix);
        assert!(!parse(&["--no-include-date-prefix"]).to_config().include_date_prefix);

        let conflict = Cli::try_parse_from([
            "iphoto-backup",
            "--include-date-prefix",
            "true",
            "--no-include-date-prefix",
        ]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_cli_overrides_settings() {
        let from_file = Config {
            filter: "Fall".into(),
            output_dir: PathBuf::from("/srv/pics"),
            include_date_prefix: false,
            ..Config::default()
        };

        let merged = parse(&["-e", "Summer", "-n"]).merge_with_config(from_file);
        assert_eq!(merged.filter, "Summer");
        assert_eq!(merged.output_dir, PathBuf::from("/srv/pics"));
        assert!(!merged.include_date_prefix);
        assert!(merged.dry_run);
    }

    #[test]
    fn test_save_settings_keeps_flags() {
        let cli = parse(&["--save-settings", "out.toml", "-e", "Summer", "-n"]);
        assert_eq!(cli.save_settings, Some(PathBuf::from("out.toml")));

        let config = cli.to_config();
        assert_eq!(config.filter, "Summer");
        assert!(config.dry_run);
    }

    #[test]
    fn test_json_log_requires_log_file() {
        assert!(Cli::try_parse_from(["iphoto-backup", "--json-log"]).is_err());
        let with_file = ["iphoto-backup", "--json-log", "--log-file", "x.log"];
        assert!(Cli::try_parse_from(with_file).is_ok());
    }
}
