// psstrip/src/ui/summary.rs
//! Totals report printed at the end of a run.

use anyhow::Result;
use chrono::Local;
use comfy_table::{presets, Cell, CellAlignment, Table};
use owo_colors::OwoColorize;
use psstrip_core::Totals;
use std::io::Write;

use crate::ui::output_format::print_success_message;

/// Builds the totals table.
pub fn totals_table(totals: &Totals, supports_color: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(if supports_color { presets::UTF8_FULL } else { presets::ASCII_FULL });
    table.set_header(vec!["Category", "Count"]);
    let rows = [
        ("Users", totals.users),
        ("Workgroups", totals.workgroups),
        ("Copied", totals.copied),
        ("Stripped", totals.stripped),
        ("Replaced", totals.replaced),
        ("Skipped", totals.skipped),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(count).set_alignment(CellAlignment::Right)]);
    }
    table.add_row(vec![
        Cell::new("Files"),
        Cell::new(totals.files()).set_alignment(CellAlignment::Right),
    ]);
    table
}

/// Prints the heading and the totals table.
pub fn print_totals<W: Write>(totals: &Totals, writer: &mut W, supports_color: bool) -> Result<()> {
    let heading = format!("Strip summary ({})", Local::now().format("%Y-%m-%d %H:%M:%S"));
    if supports_color {
        writeln!(writer, "\n{}", heading.bold())?;
    } else {
        writeln!(writer, "\n{}", heading)?;
    }
    writeln!(writer, "{}", totals_table(totals, supports_color))?;
    print_success_message(writer, "Done.", supports_color)?;
    Ok(())
}

/// Prints the totals as pretty JSON.
pub fn print_totals_json<W: Write>(totals: &Totals, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, totals)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Totals {
        Totals {
            users: 3,
            workgroups: 2,
            skipped: 3,
            stripped: 4,
            replaced: 1,
            copied: 2,
        }
    }

    #[test]
    fn table_lists_every_category() {
        let rendered = totals_table(&sample(), false).to_string();
        for label in ["Users", "Workgroups", "Copied", "Stripped", "Replaced", "Skipped", "Files"] {
            assert!(rendered.contains(label), "missing {}", label);
        }
        assert!(rendered.contains("10"));
    }

    #[test]
    fn json_uses_field_names() {
        let mut out = Vec::new();
        print_totals_json(&sample(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["stripped"], 4);
        assert_eq!(value["users"], 3);
    }
}
