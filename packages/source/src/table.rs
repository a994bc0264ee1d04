//! Delimited table reader.
//!
//! Reads a flat delimited file whose header sits below a free-text
//! preamble, normalizes the header names, and stores every cell as an
//! optional string with the `-9` sentinel already mapped to `None`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::SourceError;
use crate::parsing::{clean_cell, normalize_header};

/// A loaded table with normalized headers and sentinel-cleaned cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    index: BTreeMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Reads a table from disk.
    ///
    /// `header_row` is 1-based: a value of 5 skips four preamble lines.
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceLoad`] if the file cannot be read and
    /// [`SourceError::MalformedSource`] if it has no header row.
    pub fn read_path(path: &Path, name: &str, header_row: usize) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| SourceError::SourceLoad {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let text = String::from_utf8_lossy(&bytes);
        Self::parse(&text, name, header_row)
    }

    /// Parses a table from already-loaded text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedSource`] if the text has no header
    /// row, or [`SourceError::Csv`] if a record cannot be read.
    pub fn parse(text: &str, name: &str, header_row: usize) -> Result<Self, SourceError> {
        let body = skip_lines(text, header_row.saturating_sub(1));

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        if headers.iter().all(String::is_empty) {
            return Err(SourceError::MalformedSource {
                source_name: name.to_owned(),
                message: format!("no header row found at line {header_row}"),
            });
        }

        let mut index = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            if !header.is_empty() {
                index.entry(header.clone()).or_insert(i);
            }
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let row: Vec<Option<String>> = (0..headers.len())
                .map(|i| record.get(i).and_then(clean_cell))
                .collect();
            rows.push(row);
        }

        log::info!("Parsed {} rows from {name}", rows.len());

        Ok(Self {
            name: name.to_owned(),
            headers,
            index,
            rows,
        })
    }

    /// Name used in log lines and error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized header names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Index of an optional column.
    #[must_use]
    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of a required column.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedSource`] if the column is absent.
    pub fn column(&self, name: &str) -> Result<usize, SourceError> {
        self.optional_column(name)
            .ok_or_else(|| SourceError::MalformedSource {
                source_name: self.name.clone(),
                message: format!("required column '{name}' is missing"),
            })
    }
}

/// Returns a cell of a row, if the column exists and the cell is present.
#[must_use]
pub fn cell(row: &[Option<String>], column: Option<usize>) -> Option<&str> {
    column.and_then(|i| row.get(i)).and_then(Option::as_deref)
}

/// Skips `n` lines of `text`.
fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "Fatal crashes\nSource: BITRE\n\n\n";

    #[test]
    fn reads_header_below_preamble() {
        let text = format!("{PREAMBLE}Crash ID,Bus  Involvement,Year\n1,No,2010\n2,-9,2011\n");
        let table = RawTable::parse(&text, "crashes", 5).unwrap();
        assert_eq!(table.headers(), ["crash id", "bus involvement", "year"]);
        assert_eq!(table.rows().len(), 2);

        let bus = table.optional_column("bus involvement");
        assert_eq!(cell(&table.rows()[0], bus), Some("No"));
        assert_eq!(cell(&table.rows()[1], bus), None);
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let table = RawTable::parse("Crash ID\n1\n", "crashes", 1).unwrap();
        let err = table.column("year").unwrap_err();
        assert!(matches!(err, SourceError::MalformedSource { .. }));
    }

    #[test]
    fn short_rows_and_blank_lines_are_tolerated() {
        let table = RawTable::parse("a,b,c\n1,2\n,,\n4,5,6\n", "t", 1).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(cell(&table.rows()[0], Some(2)), None);
        assert_eq!(cell(&table.rows()[1], Some(2)), Some("6"));
    }

    #[test]
    fn empty_file_has_no_header() {
        let err = RawTable::parse("only\npreamble\n", "t", 5).unwrap_err();
        assert!(matches!(err, SourceError::MalformedSource { .. }));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = RawTable::read_path(Path::new("/nonexistent/road_toll.csv"), "t", 1).unwrap_err();
        assert!(matches!(err, SourceError::SourceLoad { .. }));
    }
}
