//! Population reference tables.
//!
//! The two ABS reference files are spreadsheets exported to text: titles,
//! notes, and blank rows surround the data, and the data itself has no
//! reliable header. Parsing is split in two phases:
//!
//! 1. [`tokenize`] turns every line into a [`ReferenceLine`] (raw text plus
//!    comma-separated fields).
//! 2. [`lga`] and [`remoteness`] classify those lines into typed candidates
//!    and extract the rows they accept.

pub mod lga;
pub mod remoteness;

use crate::parsing::parse_non_negative;

pub use lga::{LgaReferenceRow, parse_lga_reference};
pub use remoteness::{RemotenessReferenceRow, parse_remoteness_reference};

/// One tokenized line of a reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLine {
    /// 1-based line number in the file.
    pub number: usize,
    /// The line with surrounding whitespace removed.
    pub text: String,
    /// Comma-separated fields, each trimmed.
    pub fields: Vec<String>,
}

impl ReferenceLine {
    /// Whether the raw line contains `token` (case-sensitive).
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.text.contains(token)
    }

    /// Returns a field by position, if present and non-empty.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    /// Returns the first field that looks like a non-negative number.
    #[must_use]
    pub fn first_number(&self) -> Option<f64> {
        self.fields.iter().find_map(|f| parse_non_negative(f))
    }
}

/// Splits reference text into tokenized lines.
#[must_use]
pub fn tokenize(text: &str) -> Vec<ReferenceLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let text = line.trim().to_owned();
            let fields = text.split(',').map(|f| f.trim().to_owned()).collect();
            ReferenceLine {
                number: i + 1,
                text,
                fields,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_fields() {
        let lines = tokenize("Title\n 10050 , Albury (C), 56093 \n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].number, 2);
        assert_eq!(lines[1].fields, vec!["10050", "Albury (C)", "56093"]);
        assert_eq!(lines[1].field(1), Some("Albury (C)"));
        assert_eq!(lines[0].field(1), None);
    }

    #[test]
    fn first_number_skips_text_fields() {
        let lines = tokenize("Major Cities of Australia,,5432.5,12");
        assert_eq!(lines[0].first_number(), Some(5432.5));
        assert_eq!(tokenize("no numbers, here")[0].first_number(), None);
    }
}
