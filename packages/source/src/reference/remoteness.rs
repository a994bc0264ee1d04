//! Remoteness area population reference.
//!
//! The file holds one block per jurisdiction. A block is introduced by a
//! line naming the jurisdiction together with the word `Australia`; the
//! five remoteness classes follow within the next few lines, each carrying
//! its population as the first numeric field.

use road_toll_crash_models::{Jurisdiction, RemotenessCategory};
use serde::Serialize;

use super::{ReferenceLine, tokenize};

/// Number of lines, starting at the block header, searched for each
/// remoteness class.
pub const BLOCK_SCAN_LINES: usize = 10;

/// One jurisdiction/remoteness-class population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemotenessReferenceRow {
    /// Jurisdiction of the block the row was found in.
    pub state: Jurisdiction,
    /// Remoteness class.
    pub category: RemotenessCategory,
    /// Synthesized area name, e.g. `"Major Cities Australia (NSW)"`.
    pub area_name: String,
    /// Population of the class within the jurisdiction.
    pub population: f64,
}

/// What a tokenized line means to the remoteness parser.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RemotenessLine {
    /// Jurisdiction introduced by this line, if it is a block header.
    block: Option<Jurisdiction>,
    /// Most specific remoteness class named on the line.
    category: Option<RemotenessCategory>,
    /// First numeric field.
    population: Option<f64>,
}

fn classify(line: &ReferenceLine) -> RemotenessLine {
    let block = if line.contains("Australia") {
        Jurisdiction::find_in(&line.text)
    } else {
        None
    };

    RemotenessLine {
        block,
        category: RemotenessCategory::find_in(&line.text),
        population: line.first_number(),
    }
}

/// Builds the area name used to match crash-data remoteness text.
#[must_use]
pub fn area_name(category: RemotenessCategory, state: Jurisdiction) -> String {
    format!("{} Australia ({})", category.label(), state.reference_label())
}

/// Parses the remoteness reference text.
///
/// For each jurisdiction the first block header is used. Within the
/// [`BLOCK_SCAN_LINES`] lines starting at that header, the first line
/// naming a class decides that class: it yields a row when it carries a
/// number and nothing otherwise. Rows are ordered by jurisdiction code, then
/// class.
#[must_use]
pub fn parse_remoteness_reference(text: &str) -> Vec<RemotenessReferenceRow> {
    let lines: Vec<RemotenessLine> = tokenize(text).iter().map(classify).collect();
    let mut rows = Vec::new();

    for state in Jurisdiction::all().iter().copied() {
        let Some(start) = lines.iter().position(|l| l.block == Some(state)) else {
            log::debug!("Remoteness reference: no block for {state}");
            continue;
        };
        let end = (start + BLOCK_SCAN_LINES).min(lines.len());
        let block = &lines[start..end];

        for category in RemotenessCategory::all().iter().copied() {
            let Some(line) = block.iter().find(|l| l.category == Some(category)) else {
                continue;
            };
            if let Some(population) = line.population {
                rows.push(RemotenessReferenceRow {
                    state,
                    category,
                    area_name: area_name(category, state),
                    population,
                });
            }
        }
    }

    log::info!("Extracted {} remoteness reference rows", rows.len());
    rows
}
