//! Column-wise combination of per-rater result tables.

use crate::table::Table;
use tracing::warn;

/// Concatenate tables column-wise, in input order.
///
/// All inputs are expected to describe the same abstracts in the same row
/// order, so row counts should match; when they do not, the mismatch is
/// logged and shorter tables are padded with missing cells. Duplicate
/// header names are preserved as-is; lookups by name resolve to the first
/// occurrence.
pub fn combine_tables(tables: &[Table]) -> Table {
    let num_rows = tables.iter().map(Table::len).max().unwrap_or(0);
    if tables.iter().any(|t| t.len() != num_rows) {
        warn!(
            row_counts = ?tables.iter().map(Table::len).collect::<Vec<_>>(),
            "input tables have differing row counts; padding with missing cells"
        );
    }

    let mut headers = Vec::new();
    for table in tables {
        headers.extend(table.headers().iter().cloned());
    }

    let mut rows = Vec::with_capacity(num_rows);
    for i in 0..num_rows {
        let mut row = Vec::with_capacity(headers.len());
        for table in tables {
            match table.row(i) {
                Some(cells) => row.extend(cells.iter().cloned()),
                None => row.extend(std::iter::repeat_n(None, table.width())),
            }
        }
        rows.push(row);
    }

    Table::from_rows(headers, rows)
}
