//! Pattern compilation and content stripping.
//!
//! `compiler` turns configured pattern strings and identity tokens into
//! regexes, collecting every failure into one report. `stripper` applies an
//! ordered list of compiled substitutions to file content, either whole or
//! line by line.

pub mod compiler;
pub mod stripper;
