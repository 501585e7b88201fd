//! Tabular parser for prison capacity reports
//!
//! One parser core serves every document format. Recovered text arrives as
//! pages of lines (or spreadsheet cell rows) and runs through a single state
//! machine that finds the header, collects data rows and stops at the footer.
//!
//! ## Architecture
//!
//! - [`header`] - header detection, tokenizing and the standard layout
//! - [`record_parser`] - the line state machine and record building
//! - [`field_parsers`] - token classification and metric coercion
//! - [`validator`] - structural checks for legacy binary tables
//! - [`stats`] - parsing statistics and result structures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use prison_capacity::config::PipelineConfig;
//! use prison_capacity::parser::DocumentParser;
//! use prison_capacity::recovery::Capabilities;
//!
//! # fn example() -> prison_capacity::Result<()> {
//! let parser = DocumentParser::new(&PipelineConfig::default(), Capabilities::probe())?;
//! let result = parser.parse_file(std::path::Path::new("bulletin-march-2023.pdf"))?;
//!
//! println!("Parsed {} facilities", result.table.len());
//! # Ok(())
//! # }
//! ```

pub mod field_parsers;
pub mod header;
pub mod record_parser;
pub mod stats;
pub mod validator;

#[cfg(test)]
pub mod tests;

pub use header::HeaderLayout;
pub use record_parser::{LineOptions, ParserState, RawRow};
pub use stats::{ParseResult, ParseStats};
pub use validator::StructuralIssue;

use crate::config::{PipelineConfig, StructuralLimits};
use crate::date_resolver::DateResolver;
use crate::error::{CapacityError, Result};
use crate::models::{DocumentFormat, RawDocument, RecoveredText};
use crate::oracle::TextOracle;
use crate::recovery::{Capabilities, TextRecovery};
use std::path::Path;
use tracing::{debug, info, warn};

/// Pure parser from recovered text to a table
#[derive(Debug, Clone, Default)]
pub struct TableParser {
    limits: StructuralLimits,
}

impl TableParser {
    pub fn new(limits: StructuralLimits) -> Self {
        Self { limits }
    }

    /// Parse recovered text laid out as the given format
    ///
    /// Parsing the same text twice yields the same table.
    pub fn parse(&self, text: &RecoveredText, format: DocumentFormat) -> ParseResult {
        let scan = record_parser::scan(text, LineOptions::for_format(format));
        let mut stats = scan.stats;

        let Some(header) = scan.header else {
            debug!("No header found in {} lines", stats.lines_seen);
            return ParseResult {
                stats,
                ..ParseResult::empty()
            };
        };

        if format == DocumentFormat::LegacyWord {
            if let Err(issue) = validator::validate_rows(&scan.rows, &self.limits) {
                debug!("Legacy table rejected: {}", issue);
                stats.rejection = Some(issue.to_string());
                return ParseResult {
                    stats,
                    ..ParseResult::empty()
                };
            }
        }

        let table = record_parser::build_records(&header, scan.rows, &mut stats);
        ParseResult { table, stats }
    }

    /// Relaxed scan of every line under the standard layout
    pub fn parse_relaxed(&self, text: &RecoveredText) -> ParseResult {
        let rows = record_parser::relaxed_rows(text);
        let mut stats = ParseStats::new();
        stats.lines_seen = text.line_count();
        stats.rows_collected = rows.len();
        stats.relaxed_rows = rows.len();

        let table = record_parser::build_records(&HeaderLayout::standard(), rows, &mut stats);
        ParseResult { table, stats }
    }
}

/// Recovery, parsing and date resolution for one document
#[derive(Debug, Clone)]
pub struct DocumentParser {
    recovery: TextRecovery,
    parser: TableParser,
    dates: DateResolver,
}

impl DocumentParser {
    pub fn new(config: &PipelineConfig, capabilities: Capabilities) -> Result<Self> {
        let oracle = TextOracle::new(config.oracle.clone())?;
        Ok(Self {
            recovery: TextRecovery::new(capabilities, oracle, config.tool_timeout()),
            parser: TableParser::new(config.structural_limits.clone()),
            dates: DateResolver::new()?,
        })
    }

    pub fn dates(&self) -> &DateResolver {
        &self.dates
    }

    pub fn recovery(&self) -> &TextRecovery {
        &self.recovery
    }

    /// Read and parse a file from disk
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        let document = RawDocument::open(path)?.ok_or_else(|| CapacityError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        Ok(self.parse_document(&document))
    }

    /// Parse a loaded document; an unusable document yields an empty table
    pub fn parse_document(&self, document: &RawDocument) -> ParseResult {
        info!("Parsing {} file: {}", document.format.label(), document.file_name());

        let recovered = self.recovery.recover(document);
        let mut result = self.parser.parse(&recovered, document.format);
        let mut content = recovered.plain_text();

        if result.table.is_empty() && document.format == DocumentFormat::PageDocument {
            let all_pages = self.recovery.recover_all_pages(document);
            let relaxed = self.parser.parse_relaxed(&all_pages);
            if !relaxed.table.is_empty() {
                warn!(
                    "No table found in {}, using {} rows from relaxed page scan",
                    document.file_name(),
                    relaxed.table.len()
                );
                content = all_pages.plain_text();
                result = relaxed;
            }
        }

        if !result.table.is_empty() {
            if let Some(date) = self.dates.resolve(Some(&content), &document.file_name()) {
                result.table.set_report_date(date);
            }
        }

        debug!(
            "{}: {} rows kept of {} collected ({:.1}%)",
            document.file_name(),
            result.table.len(),
            result.stats.rows_collected,
            result.stats.success_rate()
        );
        result
    }
}
