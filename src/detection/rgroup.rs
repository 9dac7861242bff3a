//! Substituent ("R-group") tables from recognized label text.
//!
//! Each text line becomes one combination. A line is split on `:` into
//! segments; segments without `=` are identifiers (compound names or numbers),
//! segments with `=` are `,`/`;` separated assignment clauses such as `R=CH3`
//! or the chained `R1=R2=H`.
//!
//! ```
//! use schematic_resolver::detection::rgroup::parse_text;
//!
//! let combo = parse_text("2:R1=H,R2=OMe:T(MQ)EN");
//! assert_eq!(combo.tag(), Some("T(MQ)EN"));
//! assert_eq!(combo.assignments(), vec![("R1", "H"), ("R2", "OMe")]);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::detection::ocr::clean_output;
use crate::models::{BoundingBox, Diagram, RGroupCombination, TextLine, Token};

/// Substituent variable names: `R`, `R1`, `Ar`, `X`, `R'`
static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]?[0-9]*['′]*$").expect("Invalid variable regex"));

static CLAUSE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;]").expect("Invalid separator regex"));

/// Parse the assignment clauses of one segment, or `None` when any clause is malformed
fn parse_assignments(segment: &str) -> Option<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for clause in clauses(segment) {
        let parts: Vec<&str> = clause.split('=').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let (value, variables) = parts.split_last()?;
        if !variables.iter().all(|v| VARIABLE.is_match(v)) {
            return None;
        }
        pairs.extend(variables.iter().map(|v| (v.to_string(), value.to_string())));
    }
    Some(pairs)
}

/// Non-empty `,`/`;` separated clauses of a segment
fn clauses(segment: &str) -> impl Iterator<Item = &str> {
    CLAUSE_SEPARATOR.split(segment).filter(|c| !c.is_empty())
}

/// Clauses ahead of the first assignment, e.g. the `MeNAPH` of `MeNAPH,R=CH3`
fn leading_names(segment: &str) -> impl Iterator<Item = &str> {
    clauses(segment).take_while(|c| !c.contains('='))
}

/// OCR often separates a compound name from its assignments with a space
/// instead of `:` (`1a R = H`). Turn that space into a segment break before
/// whitespace is stripped.
fn split_leading_name(text: &str) -> String {
    if text.contains(':') || !text.contains('=') {
        return clean_output(text);
    }
    let mut words = text.split_whitespace();
    match (words.next(), words.clone().next()) {
        (Some(name), Some(next)) if !name.contains('=') && !next.starts_with('=') => {
            format!("{}:{}", name, words.collect::<String>())
        }
        _ => clean_output(text),
    }
}

/// Parse one line of label text located at `bbox`
pub fn parse_line(text: &str, bbox: BoundingBox) -> RGroupCombination {
    let cleaned = split_leading_name(text);
    let mut combination = RGroupCombination::default();
    let mut pairs = Vec::new();
    let mut malformed = false;

    for segment in cleaned.split(':').filter(|s| !s.is_empty()) {
        if !segment.contains('=') {
            combination.identifiers.push(segment.to_string());
            continue;
        }
        match parse_assignments(segment) {
            Some(found) => pairs.extend(found),
            None => {
                malformed = true;
                combination
                    .identifiers
                    .extend(leading_names(segment).map(str::to_string));
            }
        }
    }

    if malformed {
        debug!(text = %cleaned, "unparsable substituent assignment");
        return combination;
    }

    combination.pairs = pairs
        .into_iter()
        .map(|(variable, value)| {
            (
                Token { text: variable, bbox },
                Token { text: value, bbox },
            )
        })
        .collect();
    combination
}

/// Parse a bare string with an empty source box
pub fn parse_text(text: &str) -> RGroupCombination {
    parse_line(
        text,
        BoundingBox {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        },
    )
}

/// One combination per OCR line, in line order
pub fn parse_lines(lines: &[TextLine]) -> Vec<RGroupCombination> {
    lines
        .iter()
        .map(|line| parse_line(&line.text, line.bbox))
        .collect()
}

/// Fill the substituent table of a diagram's label from its recognized text.
/// Diagrams without a label come back unchanged.
pub fn detect_r_group(mut diagram: Diagram) -> Diagram {
    if let Some(label) = diagram.label.as_mut() {
        label.r_group = parse_lines(&label.text);
        debug!(
            diagram = diagram.panel.tag,
            combinations = label.r_group.len(),
            r_group = label.has_r_group(),
            "parsed label text"
        );
    }
    diagram
}
