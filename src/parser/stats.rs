//! Parsing statistics and result structures for capacity tables
//!
//! Tracks how a document's lines were classified and how rows were repaired
//! on their way into a [`ParsedTable`].

use crate::models::ParsedTable;

/// Parsed table with the statistics gathered while building it
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Rows that survived parsing
    pub table: ParsedTable,

    /// Line and row statistics
    pub stats: ParseStats,
}

impl ParseResult {
    pub fn empty() -> Self {
        Self {
            table: ParsedTable::empty(),
            stats: ParseStats::new(),
        }
    }
}

/// Line and row statistics for one document
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseStats {
    /// Non-empty lines examined
    pub lines_seen: usize,

    /// A header row was found
    pub header_found: bool,

    /// The standard layout replaced the document's header
    pub header_substituted: bool,

    /// Candidate rows collected from the data section
    pub rows_collected: usize,

    /// Rows whose surplus leading tokens were folded into the name
    pub rows_folded: usize,

    /// Rows padded with nulls to the header width
    pub rows_padded: usize,

    /// Rows dropped for an empty or "total" name
    pub rows_dropped: usize,

    /// Rows recovered by the relaxed page scan
    pub relaxed_rows: usize,

    /// Reason the structural validator rejected the table
    pub rejection: Option<String>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            lines_seen: 0,
            header_found: false,
            header_substituted: false,
            rows_collected: 0,
            rows_folded: 0,
            rows_padded: 0,
            rows_dropped: 0,
            relaxed_rows: 0,
            rejection: None,
        }
    }

    /// Rows kept as a percentage of rows collected
    pub fn success_rate(&self) -> f64 {
        if self.rows_collected == 0 {
            0.0
        } else {
            let kept = self.rows_collected.saturating_sub(self.rows_dropped);
            (kept as f64 / self.rows_collected as f64) * 100.0
        }
    }

    /// Rows needed repair (folding or padding)
    pub fn rows_repaired(&self) -> usize {
        self.rows_folded + self.rows_padded
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}
