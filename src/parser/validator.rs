//! Structural validation for tables recovered from legacy binary documents.
//!
//! Binary recovery is the least reliable path, so its rows must look like a
//! capacity table before any of them are trusted: enough rows, a sane field
//! count, alphabetic names, and figures inside the domain bound.

use super::field_parsers::parse_metric;
use super::record_parser::RawRow;
use crate::config::StructuralLimits;
use std::fmt;

/// Why a table failed structural validation
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralIssue {
    TooFewRows { found: usize, required: usize },
    FieldCount { row: usize, fields: usize },
    NameWithoutLetters { row: usize, name: String },
    ValueOutOfRange { row: usize, value: f64 },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::TooFewRows { found, required } => {
                write!(f, "{} rows found, at least {} required", found, required)
            }
            StructuralIssue::FieldCount { row, fields } => {
                write!(f, "row {} has {} fields", row, fields)
            }
            StructuralIssue::NameWithoutLetters { row, name } => {
                write!(f, "row {} name '{}' has no letters", row, name)
            }
            StructuralIssue::ValueOutOfRange { row, value } => {
                write!(f, "row {} value {} is out of range", row, value)
            }
        }
    }
}

/// Reject the whole table on the first structural problem
pub fn validate_rows(rows: &[RawRow], limits: &StructuralLimits) -> Result<(), StructuralIssue> {
    if rows.len() < limits.min_rows {
        return Err(StructuralIssue::TooFewRows {
            found: rows.len(),
            required: limits.min_rows,
        });
    }

    for (index, row) in rows.iter().enumerate() {
        let fields = row.field_count();
        if fields < limits.min_fields || fields > limits.max_fields {
            return Err(StructuralIssue::FieldCount { row: index, fields });
        }

        if !row.name.chars().any(char::is_alphabetic) {
            return Err(StructuralIssue::NameWithoutLetters {
                row: index,
                name: row.name.clone(),
            });
        }

        // Tokens that are not numbers are tolerated here.
        if let Some(value) = row
            .tokens
            .iter()
            .filter_map(|token| parse_metric(token))
            .find(|value| *value < 0.0 || *value > limits.max_value)
        {
            return Err(StructuralIssue::ValueOutOfRange { row: index, value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, tokens: &[&str]) -> RawRow {
        RawRow::new(name, tokens.iter().map(|t| t.to_string()).collect())
    }

    fn valid_rows() -> Vec<RawRow> {
        vec![
            row("Altcourse", &["794", "794", "1164", "1150", "145%", "1%"]),
            row("Ashfield", &["400", "400", "408", "390", "98%", "2%"]),
        ]
    }

    #[test]
    fn test_valid_table_passes() {
        assert_eq!(validate_rows(&valid_rows(), &StructuralLimits::default()), Ok(()));
    }

    #[test]
    fn test_single_row_rejected() {
        let rows = &valid_rows()[..1];
        assert_eq!(
            validate_rows(rows, &StructuralLimits::default()),
            Err(StructuralIssue::TooFewRows {
                found: 1,
                required: 2
            })
        );
    }

    #[test]
    fn test_field_count_bounds() {
        let mut rows = valid_rows();
        rows.push(row("Brixton", &["1"; 10]));
        assert_eq!(
            validate_rows(&rows, &StructuralLimits::default()),
            Err(StructuralIssue::FieldCount { row: 2, fields: 11 })
        );

        let mut rows = valid_rows();
        rows.push(row("Brixton", &[]));
        assert!(matches!(
            validate_rows(&rows, &StructuralLimits::default()),
            Err(StructuralIssue::FieldCount { fields: 1, .. })
        ));
    }

    #[test]
    fn test_name_needs_letters() {
        let mut rows = valid_rows();
        rows.push(row("#### ##", &["1", "2"]));
        assert!(matches!(
            validate_rows(&rows, &StructuralLimits::default()),
            Err(StructuralIssue::NameWithoutLetters { row: 2, .. })
        ));
    }

    #[test]
    fn test_values_outside_domain_bound() {
        let mut rows = valid_rows();
        rows.push(row("Garbage", &["12,345,678", "2"]));
        assert_eq!(
            validate_rows(&rows, &StructuralLimits::default()),
            Err(StructuralIssue::ValueOutOfRange {
                row: 2,
                value: 12_345_678.0
            })
        );
    }

    #[test]
    fn test_non_numeric_tokens_tolerated() {
        let mut rows = valid_rows();
        rows.push(row("Bedford", &["n/a", "322"]));
        assert!(validate_rows(&rows, &StructuralLimits::default()).is_ok());
    }
}
