//! Header row detection and column layout
//!
//! Text headers are split on tabs or runs of two or more spaces. A text
//! header that does not come out at the standard width is replaced by the
//! standard seven-column layout; the data rows' arity is trusted over
//! textual inference once the two disagree. Spreadsheet headers keep their
//! own cells.

use crate::constants::{
    CAPACITY_TERM_MARKERS, FACILITY_NAME_MARKER, HEADER_CONTINUATION_MARKER,
    STANDARD_COLUMN_COUNT, columns,
};
use crate::models::Metric;

use super::field_parsers::starts_with_letter;

/// Column layout of a detected table
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    /// Column names, facility name first
    pub columns: Vec<String>,
    /// The standard layout replaced what the document said
    pub substituted: bool,
}

impl HeaderLayout {
    pub fn standard() -> Self {
        Self {
            columns: columns::STANDARD_HEADER
                .iter()
                .map(|c| c.to_string())
                .collect(),
            substituted: false,
        }
    }

    /// Layout from a (possibly joined) text header line
    pub fn from_text(line: &str) -> Self {
        let tokens = merge_split_columns(tokenize(line));

        if tokens.len() == STANDARD_COLUMN_COUNT {
            Self {
                columns: tokens,
                substituted: false,
            }
        } else {
            Self {
                substituted: true,
                ..Self::standard()
            }
        }
    }

    /// Layout from a spreadsheet header row; positions are preserved
    pub fn from_cells(cells: &[String]) -> Self {
        Self {
            columns: cells.iter().map(|c| c.trim().to_string()).collect(),
            substituted: false,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of metric positions after the name column
    pub fn metric_width(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    /// Vocabulary metric for each metric position, `None` for unknown columns
    pub fn metric_slots(&self) -> Vec<Option<Metric>> {
        self.columns
            .iter()
            .skip(1)
            .map(|name| Metric::from_header(name))
            .collect()
    }

    /// Distinct metrics present, in column order
    pub fn metrics(&self) -> Vec<Metric> {
        let mut metrics = Vec::new();
        for metric in self.metric_slots().into_iter().flatten() {
            if !metrics.contains(&metric) {
                metrics.push(metric);
            }
        }
        metrics
    }
}

/// Facility-name marker plus at least one capacity term
pub fn is_header_text(line: &str) -> bool {
    line.contains(FACILITY_NAME_MARKER)
        && CAPACITY_TERM_MARKERS
            .iter()
            .any(|term| line.contains(term))
}

/// Spreadsheet header: first cell is exactly the facility-name marker
pub fn is_header_cells(cells: &[String]) -> bool {
    cells
        .first()
        .is_some_and(|cell| cell.trim() == FACILITY_NAME_MARKER)
}

/// Second header line wrapped from the first
pub fn is_continuation(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.contains(HEADER_CONTINUATION_MARKER) && !starts_with_letter(line)
}

/// Split on tabs or runs of two or more whitespace characters
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if !c.is_whitespace() {
            current.push(c);
            continue;
        }

        let mut run = String::from(c);
        while let Some(&next) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            run.push(next);
            chars.next();
        }

        if run.chars().count() >= 2 || run.contains('\t') {
            push_token(&mut tokens, &mut current);
        } else {
            current.push(' ');
        }
    }
    push_token(&mut tokens, &mut current);

    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

// "Operational" and "Capacity" often land in separate cells.
fn merge_split_columns(tokens: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if token == "Capacity" && merged.last().is_some_and(|last| last == "Operational") {
            if let Some(last) = merged.last_mut() {
                *last = columns::OPERATIONAL_CAPACITY.to_string();
            }
        } else {
            merged.push(token);
        }
    }

    merged
}
