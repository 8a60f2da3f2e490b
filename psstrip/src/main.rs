// psstrip/src/main.rs
//! psstrip entry point.
//!
//! Parses the command line, sets up logging and runs the strip command.
//! Any failure is printed as `Error: ...` with its cause chain and the
//! process exits with status 1.

use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use psstrip::cli::Cli;
use psstrip::commands::strip::{run_strip, StripCommandOptions};
use psstrip::logger;
use psstrip::ui::output_format::print_error_message;

fn run(cli: Cli) -> Result<()> {
    let opts = StripCommandOptions {
        source: cli.source,
        destination: cli.destination,
        force: cli.force,
        repo_version: cli.repo_version,
        rules: cli.rules,
        throttle: Duration::from_millis(cli.throttle),
        json: cli.json,
        no_summary: cli.no_summary,
        quiet: cli.quiet,
    };
    run_strip(&opts)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(cli.log_level());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stderr_supports_color = io::stderr().is_terminal();
            let _ = print_error_message(&mut io::stderr(), &format!("{:#}", e), stderr_supports_color);
            ExitCode::FAILURE
        }
    }
}
