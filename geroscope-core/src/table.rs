//! In-memory tabular data backed by CSV files.
//!
//! A [`Table`] is a header row plus rows of optional cells: a cell is `None`
//! when the underlying CSV field is empty or whitespace, the flat-file
//! rendition of a missing value. Validation files exported from spreadsheet
//! tools are often not UTF-8, so reads can decode through any
//! `encoding_rs` label (e.g. `iso-8859-1`).

use crate::error::GeroscopeError;
use std::path::Path;
use tracing::debug;

/// An ordered, fully in-memory table of optional string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Build a table from headers and rows. Ragged rows are padded with
    /// missing cells to the header width.
    pub fn from_rows(headers: Vec<String>, mut rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, None);
        }
        Self { headers, rows }
    }

    /// Read a CSV file assuming UTF-8 (invalid sequences replaced).
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, GeroscopeError> {
        Self::read_csv_with_encoding(path, "utf-8")
    }

    /// Read a CSV file, decoding the raw bytes with the named encoding
    /// before parsing. Unknown labels are a dataset error.
    pub fn read_csv_with_encoding(
        path: impl AsRef<Path>,
        encoding_label: &str,
    ) -> Result<Self, GeroscopeError> {
        let path = path.as_ref();
        let encoding = encoding_rs::Encoding::for_label(encoding_label.as_bytes())
            .ok_or_else(|| {
                GeroscopeError::dataset(format!("unknown encoding label '{}'", encoding_label))
            })?;

        let bytes = std::fs::read(path)?;
        let (decoded, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            debug!(path = %path.display(), encoding = encoding.name(),
                   "replacement characters introduced while decoding");
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<Option<String>> = record.iter().map(cell_value).collect();
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "loaded table");
        Ok(Self::from_rows(headers, rows))
    }

    /// Write the table as UTF-8 CSV; missing cells become empty fields.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), GeroscopeError> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Index of the first column with this name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// The cell at (row, column index), if present and non-empty.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// One full row of cells.
    pub fn row(&self, row: usize) -> Option<&[Option<String>]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// All non-missing values of the named column, in row order.
    pub fn non_empty_column(&self, name: &str) -> Option<Vec<String>> {
        let index = self.column(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index)?.clone())
                .collect(),
        )
    }
}

/// Normalize a raw CSV field: trimmed text, or `None` when blank.
fn cell_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
