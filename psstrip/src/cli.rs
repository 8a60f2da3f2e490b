// psstrip/src/cli.rs
//! Command-line interface definition for psstrip.
//! License: GPL-3.0-or-later

use clap::{ArgAction, Parser};
use log::LevelFilter;
use psstrip_core::RepositoryVersion;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "psstrip",
    author = "Amphora Research Systems",
    version = env!("CARGO_PKG_VERSION"),
    about = "Create a copy of a PatentSafe repository stripped of sensitive data",
    long_about = "psstrip copies a PatentSafe repository into a new directory, replacing user ids, user names and workgroup names with anonymous aliases and blanking summaries, free text and metadata. Document structure is preserved so the copy can be used for troubleshooting without exposing confidential content.",
    arg_required_else_help = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to the PatentSafe repository to copy.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory to create for the stripped copy.
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Only report errors.
    #[arg(long, short = 'q', conflicts_with_all = ["verbose", "debug"], help = "Only report errors.")]
    pub quiet: bool,

    /// Report every file as it is processed.
    #[arg(long, short = 'V', help = "Report every file as it is processed.")]
    pub verbose: bool,

    /// Enable debug logging.
    #[arg(long, short = 'd', help = "Enable debug logging.")]
    pub debug: bool,

    /// Delay between visited entries, in milliseconds.
    #[arg(
        long,
        short = 't',
        value_name = "MS",
        default_value_t = 0,
        env = "PSSTRIP_THROTTLE",
        help = "Pause this many milliseconds before each file or directory to limit load on a live server."
    )]
    pub throttle: u64,

    /// Remove an existing destination before copying.
    #[arg(long, short = 'f', help = "Remove an existing destination before copying.")]
    pub force: bool,

    /// Repository format version selecting the embedded rule set.
    #[arg(
        long = "repo-version",
        value_name = "VERSION",
        default_value = "5.x",
        help = "Repository format version: 4.8 or 5.x."
    )]
    pub repo_version: RepositoryVersion,

    /// Custom rule set file; overrides --repo-version.
    #[arg(long = "rules", value_name = "FILE", help = "Use a custom YAML rule set instead of the embedded one.")]
    pub rules: Option<PathBuf>,

    /// Print the totals as JSON on stdout.
    #[arg(long, help = "Print the totals as JSON on stdout.")]
    pub json: bool,

    /// Suppress the totals table.
    #[arg(long = "no-summary", help = "Suppress the totals table.")]
    pub no_summary: bool,

    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version, help = "Print version.")]
    pub version: Option<bool>,
}

impl Cli {
    /// Log level forced by the flags, if any.
    pub fn log_level(&self) -> Option<LevelFilter> {
        if self.quiet {
            Some(LevelFilter::Error)
        } else if self.debug {
            Some(LevelFilter::Debug)
        } else if self.verbose {
            Some(LevelFilter::Info)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["psstrip", "repo", "out"]).unwrap();
        assert_eq!(cli.repo_version, RepositoryVersion::V5);
        assert_eq!(cli.throttle, 0);
        assert!(cli.log_level().is_none());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["psstrip", "-q", "-V", "repo", "out"]).is_err());
    }

    #[test]
    fn debug_wins_over_verbose() {
        let cli = Cli::try_parse_from(["psstrip", "-V", "-d", "--repo-version", "4.8", "repo", "out"]).unwrap();
        assert_eq!(cli.log_level(), Some(LevelFilter::Debug));
        assert_eq!(cli.repo_version, RepositoryVersion::V4_8);
    }

    #[test]
    fn rejects_unknown_repo_version() {
        assert!(Cli::try_parse_from(["psstrip", "--repo-version", "3.2", "repo", "out"]).is_err());
    }
}
