//! Aligned Text Tables
//!
//! Renders a header row plus result rows as a plain-text table:
//!
//! ```text
//! Wine ID | Wine Type
//! -------------------
//! 1       | Merlot
//! ```
//!
//! # Layout Contract
//! - Column width is the longest display string in the column, header included
//! - Cells are left-justified to their column width and joined by `" | "`
//! - The separator is `sum(widths) + 3 * (columns - 1)` dashes
//! - Widths are counted in Unicode scalar values, matching the `{:<w$}` padding

use std::io::Write;

use crate::engine::ResultRow;
use crate::error::{Result, VintageError};

/// Column separator placed between cells
pub const COLUMN_SEPARATOR: &str = " | ";

/// Compute per-column widths over the headers and every row
///
/// Fails with `InvalidInput` when a row's arity differs from the header count.
pub fn column_widths<S: AsRef<str>>(headers: &[S], rows: &[ResultRow]) -> Result<Vec<usize>> {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_len(h.as_ref())).collect();

    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != headers.len() {
            return Err(VintageError::invalid_input(format!(
                "Row {row_idx} has {} cell(s) but the table has {} column(s)",
                row.len(),
                headers.len()
            )));
        }

        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(display_len(&cell.to_string()));
        }
    }

    Ok(widths)
}

/// Length of the separator line for the given widths
#[must_use]
pub fn separator_len(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + COLUMN_SEPARATOR.len() * widths.len().saturating_sub(1)
}

/// Render headers and rows as an aligned table, one line per `\n`
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[ResultRow]) -> Result<String> {
    let widths = column_widths(headers, rows)?;

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|h| h.as_ref().to_string()), &widths);
    out.push_str(&"-".repeat(separator_len(&widths)));
    out.push('\n');

    for row in rows {
        push_line(&mut out, row.cells().iter().map(ToString::to_string), &widths);
    }

    Ok(out)
}

/// Render the table and write it to `out`
pub fn write_table<S: AsRef<str>, W: Write>(
    out: &mut W,
    headers: &[S],
    rows: &[ResultRow],
) -> Result<()> {
    let table = render_table(headers, rows)?;
    out.write_all(table.as_bytes())?;
    Ok(())
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR);
    out.push_str(&line);
    out.push('\n');
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}
