// psstrip/src/ui/output_format.rs
//! Status messages on a terminal stream, coloured when it supports it.

use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes `Error: <msg>` in red.
pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "Error:".red().bold(), msg.red())
    } else {
        writeln!(writer, "Error: {}", msg)
    }
}

/// Writes a success line in green.
pub fn print_success_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{}", msg.green())
    } else {
        writeln!(writer, "{}", msg)
    }
}
