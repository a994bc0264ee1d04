//! Local government area (LGA) population reference.
//!
//! The data block starts after the first line mentioning `LGA`, `Code`,
//! and `Name`. Every later line is read as `code, name, population, ...`
//! and kept only when all three fields are present and the population is
//! a non-negative number.

use serde::Serialize;

use super::{ReferenceLine, tokenize};
use crate::parsing::parse_non_negative;

/// One accepted LGA reference row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LgaReferenceRow {
    /// ABS LGA code.
    pub code: String,
    /// LGA name (e.g. `"Albury (C)"`).
    pub name: String,
    /// Estimated resident population.
    pub population: f64,
}

/// What a tokenized line means to the LGA parser.
#[derive(Debug, Clone, PartialEq)]
enum LgaLine {
    Header,
    Row(LgaReferenceRow),
    Other,
}

const CODE_FIELD: usize = 0;
const NAME_FIELD: usize = 1;
const POPULATION_FIELD: usize = 2;

fn is_header(line: &ReferenceLine) -> bool {
    line.contains("LGA") && line.contains("Code") && line.contains("Name")
}

fn classify(line: &ReferenceLine) -> LgaLine {
    if is_header(line) {
        return LgaLine::Header;
    }

    let (Some(code), Some(name), Some(population)) = (
        line.field(CODE_FIELD),
        line.field(NAME_FIELD),
        line.field(POPULATION_FIELD),
    ) else {
        return LgaLine::Other;
    };

    parse_non_negative(population).map_or(LgaLine::Other, |population| {
        LgaLine::Row(LgaReferenceRow {
            code: code.to_owned(),
            name: name.to_owned(),
            population,
        })
    })
}

/// Parses the LGA reference text.
///
/// Returns an empty list (and logs a warning) when no header line exists.
#[must_use]
pub fn parse_lga_reference(text: &str) -> Vec<LgaReferenceRow> {
    let lines = tokenize(text);

    let Some(header_at) = lines.iter().position(is_header) else {
        log::warn!("LGA reference: no header line containing LGA/Code/Name found");
        return Vec::new();
    };

    log::debug!("LGA reference: header on line {}", lines[header_at].number);

    let rows: Vec<LgaReferenceRow> = lines[header_at + 1..]
        .iter()
        .filter_map(|line| match classify(line) {
            LgaLine::Row(row) => Some(row),
            LgaLine::Header | LgaLine::Other => None,
        })
        .collect();

    log::info!("Extracted {} LGA reference rows", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Australian Bureau of Statistics
Population by LGA, 2021
LGA Code,LGA Name,Population
10050,Albury (C),56093
10110,Armidale Regional (A),30530.0
,Missing Code,100
10150,Balranald (A),
10200,Bathurst Regional (A),n/a
10250,Bayside (A),-5

Total,,26000000
";

    #[test]
    fn accepts_only_complete_rows() {
        let rows = parse_lga_reference(SAMPLE);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Albury (C)", "Armidale Regional (A)"]);
        assert_eq!(rows[0].code, "10050");
        assert!((rows[1].population - 30530.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lines_before_header_are_ignored() {
        let text = "1,Before Header,10\nLGA Code,LGA Name,Population\n2,After,20\n";
        let rows = parse_lga_reference(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "After");
    }

    #[test]
    fn missing_header_yields_nothing() {
        assert!(parse_lga_reference("10050,Albury (C),56093\n").is_empty());
    }
}
