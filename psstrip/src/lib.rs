// psstrip/src/lib.rs
//! # psstrip CLI Application
//!
//! Command-line front end for `psstrip-core`: argument parsing, logger setup,
//! the strip command and the totals report.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
