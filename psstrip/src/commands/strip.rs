//! The strip command: copy a repository into a new, sanitized directory.

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use psstrip_core::{strip_repository, FsSink, RepositoryVersion, RuleSetConfig, StripOptions, Totals};

use crate::ui::summary;

/// Options for one invocation of the strip command.
#[derive(Debug, Clone)]
pub struct StripCommandOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub force: bool,
    pub repo_version: RepositoryVersion,
    pub rules: Option<PathBuf>,
    pub throttle: Duration,
    pub json: bool,
    pub no_summary: bool,
    pub quiet: bool,
}

/// Runs a full strip and reports the totals.
pub fn run_strip(opts: &StripCommandOptions) -> Result<Totals> {
    if !opts.source.is_dir() {
        bail!("Source repository '{}' is not a directory", opts.source.display());
    }
    prepare_destination(&opts.source, &opts.destination, opts.force)?;

    let config = load_rule_set(opts)?;
    let options = StripOptions::new(config).with_throttle(opts.throttle);
    let mut sink = FsSink::new(&opts.destination);

    let totals = strip_repository(&opts.source, &mut sink, &options)
        .with_context(|| format!("Failed to strip repository '{}'", opts.source.display()))?;

    warn!("PatentSafe repository copied to: {}", opts.destination.display());
    handle_totals(&totals, opts)?;
    Ok(totals)
}

fn load_rule_set(opts: &StripCommandOptions) -> Result<RuleSetConfig> {
    match &opts.rules {
        Some(path) => RuleSetConfig::load_from_file(path)
            .with_context(|| format!("Failed to load rule set '{}'", path.display())),
        None => {
            info!("Using embedded rule set for PatentSafe {}", opts.repo_version);
            RuleSetConfig::load_embedded(opts.repo_version)
                .with_context(|| format!("Failed to load embedded rule set {}", opts.repo_version))
        }
    }
}

/// Refuses an existing destination unless `force` is set, in which case it
/// is removed. A destination that contains the source is always refused.
fn prepare_destination(source: &Path, destination: &Path, force: bool) -> Result<()> {
    if !destination.exists() {
        return Ok(());
    }
    if !force {
        bail!(
            "Destination '{}' already exists; use --force to replace it",
            destination.display()
        );
    }

    let source_abs = source
        .canonicalize()
        .with_context(|| format!("Failed to resolve '{}'", source.display()))?;
    let dest_abs = destination
        .canonicalize()
        .with_context(|| format!("Failed to resolve '{}'", destination.display()))?;
    if source_abs.starts_with(&dest_abs) {
        bail!(
            "Refusing to remove '{}': it contains the source repository",
            destination.display()
        );
    }

    debug!("Removing existing destination {}", destination.display());
    let removed = if dest_abs.is_dir() {
        fs::remove_dir_all(destination)
    } else {
        fs::remove_file(destination)
    };
    removed.with_context(|| format!("Failed to remove existing destination '{}'", destination.display()))
}

fn handle_totals(totals: &Totals, opts: &StripCommandOptions) -> Result<()> {
    if opts.json {
        summary::print_totals_json(totals, &mut io::stdout().lock())?;
    }
    if !opts.no_summary && !opts.quiet {
        let stderr_supports_color = io::stderr().is_terminal();
        summary::print_totals(totals, &mut io::stderr(), stderr_supports_color)?;
    }
    Ok(())
}
