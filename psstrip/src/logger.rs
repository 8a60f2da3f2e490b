// psstrip/src/logger.rs
//! Logger setup for the psstrip binary.
//!
//! Messages are written to stderr without level or timestamp decoration, so
//! `-V` output reads as a plain progress report. `RUST_LOG` is honoured
//! unless a level is forced from the command line.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initializes the global logger. Calling it twice is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}
