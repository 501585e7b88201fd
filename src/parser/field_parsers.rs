//! Field parsing utilities for capacity table lines
//!
//! Helpers for classifying tokens and lines and for coercing metric cells
//! to numbers. Coercion never fails loudly: a cell that is not a number
//! becomes a null.

use crate::constants::{PAGE_PREFIX, TOTAL_MARKER};

/// A token that opens the metric part of a data line
///
/// Digits start counts (`794`, `1,164`); percentages may carry the sign at
/// either end (`97%`, `%3`).
pub fn is_numeric_token(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit()) || token.starts_with('%') || token.ends_with('%')
}

/// Coerce a metric cell: strip `%`, `,` and whitespace, then parse
pub fn parse_metric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '%' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Split a data line into the facility name and its metric tokens
///
/// Returns `None` when no token looks numeric or when the line opens with
/// one (no name to keep).
pub fn split_name_and_metrics(line: &str) -> Option<(String, Vec<String>)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let boundary = tokens.iter().position(|token| is_numeric_token(token))?;

    if boundary == 0 {
        return None;
    }

    let name = tokens[..boundary].join(" ");
    let metrics = tokens[boundary..].iter().map(|t| t.to_string()).collect();
    Some((name, metrics))
}

/// Every whitespace-separated token is numeric
pub fn is_all_numeric(line: &str) -> bool {
    let mut tokens = line.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(is_numeric_token)
}

/// `Page 3` or a bare page number
pub fn is_page_number_line(line: &str) -> bool {
    let line = line.trim();
    if !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    match line.strip_prefix(PAGE_PREFIX) {
        Some(rest) => {
            let digits = rest.trim_start();
            digits.len() < rest.len()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

pub fn starts_with_letter(line: &str) -> bool {
    line.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Names containing "total" in any case mark summary rows
pub fn is_total_name(name: &str) -> bool {
    name.to_lowercase().contains(TOTAL_MARKER)
}

pub fn contains_any(line: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| line.contains(marker))
}
