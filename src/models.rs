//! Core data structures and types for prison capacity extraction.
//!
//! Defines document formats, recovered text, the metric vocabulary, parsed
//! records and processing statistics used throughout the library.

use crate::constants::columns;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Report file formats found in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// `.rtf`
    RichText,
    /// `.doc` (OLE2 compound file)
    LegacyWord,
    /// `.pdf`
    PageDocument,
    /// `.ods`
    Spreadsheet,
    /// `.docx`
    ModernWord,
}

impl DocumentFormat {
    /// Detect the format from a file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "rtf" => Some(DocumentFormat::RichText),
            "doc" => Some(DocumentFormat::LegacyWord),
            "pdf" => Some(DocumentFormat::PageDocument),
            "ods" => Some(DocumentFormat::Spreadsheet),
            "docx" => Some(DocumentFormat::ModernWord),
            _ => None,
        }
    }

    /// Short label used in logs and statistics
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::RichText => "rtf",
            DocumentFormat::LegacyWord => "doc",
            DocumentFormat::PageDocument => "pdf",
            DocumentFormat::Spreadsheet => "ods",
            DocumentFormat::ModernWord => "docx",
        }
    }
}

/// A report file loaded for one pass through the pipeline
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    /// Read a document from disk; `None` format means the extension is unsupported
    pub fn open(path: &Path) -> std::io::Result<Option<Self>> {
        let Some(format) = DocumentFormat::from_path(path) else {
            return Ok(None);
        };
        let bytes = fs::read(path)?;
        Ok(Some(Self {
            path: path.to_path_buf(),
            format,
            bytes,
        }))
    }

    /// Build a document from bytes already in memory
    pub fn from_bytes(path: impl Into<PathBuf>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            format,
            bytes,
        }
    }

    /// File name for logging and date resolution
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// One line of recovered content
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLine {
    /// Plain text line from a word processor or page document
    Text(String),
    /// Row of spreadsheet cells
    Cells(Vec<String>),
}

impl SourceLine {
    /// Text form of the line; cells are joined with tabs
    pub fn as_text(&self) -> String {
        match self {
            SourceLine::Text(text) => text.clone(),
            SourceLine::Cells(cells) => cells.join("\t"),
        }
    }
}

/// Ordered lines recovered from a document, grouped by page
///
/// Empty recovered text is a valid outcome meaning "no usable content".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveredText {
    pages: Vec<Vec<SourceLine>>,
}

impl RecoveredText {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-page text split into lines
    pub fn from_text(text: &str) -> Self {
        Self::from_pages([text])
    }

    /// One entry per page, each split into lines
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages = pages
            .into_iter()
            .map(|page| {
                page.as_ref()
                    .lines()
                    .map(|line| SourceLine::Text(line.to_string()))
                    .collect::<Vec<_>>()
            })
            .filter(|lines| !lines.is_empty())
            .collect();
        Self { pages }
    }

    /// Spreadsheet rows as a single page of cell lines
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::empty();
        }
        Self {
            pages: vec![rows.into_iter().map(SourceLine::Cells).collect()],
        }
    }

    pub fn pages(&self) -> &[Vec<SourceLine>] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|page| page.is_empty())
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|page| page.len()).sum()
    }

    /// Whole content as newline-separated text
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .flatten()
            .map(SourceLine::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fixed metric vocabulary of a capacity table
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Metric {
    BaselineCapacity,
    InUseCapacity,
    OperationalCapacity,
    Population,
    PctPopulationToInUse,
    PctAccommodationAvailable,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::BaselineCapacity,
        Metric::InUseCapacity,
        Metric::OperationalCapacity,
        Metric::Population,
        Metric::PctPopulationToInUse,
        Metric::PctAccommodationAvailable,
    ];

    /// Column name in per-file and combined CSVs
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::BaselineCapacity => columns::BASELINE_CNA,
            Metric::InUseCapacity => columns::IN_USE_CNA,
            Metric::OperationalCapacity => columns::OPERATIONAL_CAPACITY,
            Metric::Population => columns::POPULATION,
            Metric::PctPopulationToInUse => columns::PCT_POP_TO_IN_USE,
            Metric::PctAccommodationAvailable => columns::PCT_ACCOMMODATION_AVAILABLE,
        }
    }

    /// Snake-case key
    pub fn key(&self) -> &'static str {
        match self {
            Metric::BaselineCapacity => "baseline_capacity",
            Metric::InUseCapacity => "in_use_capacity",
            Metric::OperationalCapacity => "operational_capacity",
            Metric::Population => "population",
            Metric::PctPopulationToInUse => "pct_population_to_in_use",
            Metric::PctAccommodationAvailable => "pct_accommodation_available",
        }
    }

    /// Map a header cell onto the vocabulary
    ///
    /// Matching is loose because reports spell headers differently across
    /// years ("Population", "Population *", "Operational Capacity**").
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header
            .trim()
            .trim_end_matches('*')
            .trim()
            .to_ascii_lowercase();

        if normalized.is_empty() {
            return None;
        }
        if normalized.contains("accommodation") {
            return Some(Metric::PctAccommodationAvailable);
        }
        if normalized.starts_with('%') && normalized.contains("pop") {
            return Some(Metric::PctPopulationToInUse);
        }
        if normalized.contains("baseline") {
            return Some(Metric::BaselineCapacity);
        }
        if normalized.contains("in use") {
            return Some(Metric::InUseCapacity);
        }
        if normalized.contains("operational") {
            return Some(Metric::OperationalCapacity);
        }
        if normalized.starts_with("population") {
            return Some(Metric::Population);
        }
        None
    }

    /// True for the derived percentage columns
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Metric::PctPopulationToInUse | Metric::PctAccommodationAvailable
        )
    }
}

/// One parsed facility row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub facility_name: String,
    pub metrics: BTreeMap<Metric, Option<f64>>,
    pub report_date: Option<NaiveDate>,
}

impl TableRecord {
    pub fn new(facility_name: impl Into<String>) -> Self {
        Self {
            facility_name: facility_name.into(),
            metrics: BTreeMap::new(),
            report_date: None,
        }
    }

    /// Value of a metric; `None` when absent or null
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied().flatten()
    }
}

/// Rows parsed from one file plus the metric columns that file carried
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub records: Vec<TableRecord>,
    pub columns: Vec<Metric>,
    pub report_date: Option<NaiveDate>,
}

impl ParsedTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Stamp a report date on the table and every record
    pub fn set_report_date(&mut self, date: NaiveDate) {
        self.report_date = Some(date);
        for record in &mut self.records {
            record.report_date = Some(date);
        }
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
