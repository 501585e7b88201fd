//! Line-level table scanning and record building
//!
//! [`scan`] walks recovered lines through the `SeekingHeader ->
//! InDataSection -> Done` state machine and collects raw rows.
//! [`build_records`] then reconciles each row against the header layout and
//! coerces its metric cells.

use super::field_parsers::{
    contains_any, is_all_numeric, is_numeric_token, is_page_number_line, is_total_name,
    parse_metric, split_name_and_metrics, starts_with_letter,
};
use super::header::{HeaderLayout, is_continuation, is_header_cells, is_header_text};
use super::stats::ParseStats;
use crate::constants::{FOOTER_MARKERS, PAGE_PREFIX, RELAXED_HEADER_KEYWORDS, REPORT_DATE_PREFIX};
use crate::models::{DocumentFormat, ParsedTable, RecoveredText, SourceLine, TableRecord};
use tracing::debug;

/// Position of the scanner within one page of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    SeekingHeader,
    InDataSection,
    Done,
}

/// Facility name plus the metric tokens that followed it
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub name: String,
    pub tokens: Vec<String>,
}

impl RawRow {
    pub fn new(name: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tokens,
        }
    }

    /// Name field plus metric fields
    pub fn field_count(&self) -> usize {
        1 + self.tokens.len()
    }
}

/// Format-specific line handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineOptions {
    /// Hold a name-only line and pair it with the next all-numeric line
    pub pair_bare_names: bool,
    /// Ignore bare page-number lines
    pub skip_page_numbers: bool,
}

impl LineOptions {
    pub fn for_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::PageDocument => Self {
                pair_bare_names: true,
                skip_page_numbers: true,
            },
            _ => Self::default(),
        }
    }
}

/// Header and raw rows found in a document
#[derive(Debug, Clone, Default)]
pub struct SectionScan {
    pub header: Option<HeaderLayout>,
    pub rows: Vec<RawRow>,
    pub stats: ParseStats,
}

/// Run the state machine over every page of recovered text
///
/// Each page starts afresh in `SeekingHeader`; the first header found
/// defines the layout for the whole document.
pub fn scan(text: &RecoveredText, options: LineOptions) -> SectionScan {
    let mut result = SectionScan::default();

    for page in text.pages() {
        scan_page(page, options, &mut result);
    }

    result.stats.rows_collected = result.rows.len();
    result
}

fn scan_page(page: &[SourceLine], options: LineOptions, result: &mut SectionScan) {
    let mut state = ParserState::SeekingHeader;
    let mut held_name: Option<String> = None;
    let mut index = 0;

    while index < page.len() && state != ParserState::Done {
        let line = &page[index];
        index += 1;

        match line {
            SourceLine::Cells(cells) => {
                if cells.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                result.stats.lines_seen += 1;
                state = scan_cells(cells, state, result);
            }
            SourceLine::Text(raw) => {
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                result.stats.lines_seen += 1;

                match state {
                    ParserState::SeekingHeader => {
                        if !is_header_text(line) {
                            continue;
                        }

                        let mut header_line = line.to_string();
                        if let Some(SourceLine::Text(next)) = page.get(index) {
                            if is_continuation(next) {
                                header_line.push(' ');
                                header_line.push_str(next.trim());
                                index += 1;
                            }
                        }

                        adopt_header(HeaderLayout::from_text(&header_line), result);
                        state = ParserState::InDataSection;
                    }
                    ParserState::InDataSection => {
                        state = scan_data_line(line, options, &mut held_name, result);
                    }
                    ParserState::Done => {}
                }
            }
        }
    }
}

fn scan_cells(cells: &[String], state: ParserState, result: &mut SectionScan) -> ParserState {
    match state {
        ParserState::SeekingHeader => {
            if is_header_cells(cells) {
                adopt_header(HeaderLayout::from_cells(cells), result);
                ParserState::InDataSection
            } else {
                state
            }
        }
        ParserState::InDataSection => {
            let name = cells.first().map(|cell| cell.trim()).unwrap_or_default();

            if is_total_name(name) {
                return ParserState::Done;
            }
            if is_header_cells(cells) {
                return state;
            }

            // Cells are positional: fit them to the header width here so
            // reconciliation never folds a cell into the name.
            let width = result
                .header
                .as_ref()
                .map(HeaderLayout::metric_width)
                .unwrap_or_default();
            let mut tokens: Vec<String> = cells
                .iter()
                .skip(1)
                .take(width)
                .map(|cell| cell.trim().to_string())
                .collect();
            tokens.resize(width, String::new());

            result.rows.push(RawRow::new(name, tokens));
            state
        }
        ParserState::Done => state,
    }
}

fn scan_data_line(
    line: &str,
    options: LineOptions,
    held_name: &mut Option<String>,
    result: &mut SectionScan,
) -> ParserState {
    if contains_any(line, FOOTER_MARKERS) {
        return ParserState::Done;
    }

    if line.starts_with(REPORT_DATE_PREFIX) || line.starts_with(PAGE_PREFIX) {
        return ParserState::InDataSection;
    }
    if is_header_text(line) {
        return ParserState::InDataSection;
    }
    if options.skip_page_numbers && is_page_number_line(line) {
        return ParserState::InDataSection;
    }

    if options.pair_bare_names && is_all_numeric(line) {
        if let Some(name) = held_name.take() {
            let tokens = line.split_whitespace().map(str::to_string).collect();
            result.rows.push(RawRow::new(name, tokens));
        }
        return ParserState::InDataSection;
    }

    if !starts_with_letter(line) {
        return ParserState::InDataSection;
    }

    match split_name_and_metrics(line) {
        Some((name, tokens)) => {
            *held_name = None;
            result.rows.push(RawRow::new(name, tokens));
        }
        None if options.pair_bare_names => {
            *held_name = Some(line.to_string());
        }
        None => {}
    }

    ParserState::InDataSection
}

fn adopt_header(layout: HeaderLayout, result: &mut SectionScan) {
    if result.header.is_some() {
        return;
    }

    debug!(
        "Header found with {} columns (substituted: {})",
        layout.len(),
        layout.substituted
    );
    result.stats.header_found = true;
    result.stats.header_substituted = layout.substituted;
    result.header = Some(layout);
}

/// Reconcile raw rows against the header and coerce their metrics
///
/// Rows are never dropped for arity: surplus leading tokens fold into the
/// name and short rows are padded with nulls.
pub fn build_records(header: &HeaderLayout, rows: Vec<RawRow>, stats: &mut ParseStats) -> ParsedTable {
    let width = header.metric_width();
    let slots = header.metric_slots();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let RawRow { mut name, mut tokens } = row;

        if tokens.len() > width {
            let excess = tokens.len() - width;
            let folded: Vec<String> = tokens.drain(..excess).collect();
            name = format!("{} {}", name, folded.join(" "));
            stats.rows_folded += 1;
        } else if tokens.len() < width {
            tokens.resize(width, String::new());
            stats.rows_padded += 1;
        }

        let name = name.trim();
        if name.is_empty() || is_total_name(name) {
            stats.rows_dropped += 1;
            continue;
        }

        let mut record = TableRecord::new(name);
        for (slot, token) in slots.iter().zip(tokens.iter()) {
            if let Some(metric) = slot {
                record
                    .metrics
                    .entry(*metric)
                    .or_insert_with(|| parse_metric(token));
            }
        }
        records.push(record);
    }

    ParsedTable {
        records,
        columns: header.metrics(),
        report_date: None,
    }
}

/// Rows for the relaxed page scan
///
/// A page contributes only once a line naming the table vocabulary
/// (`Prison`, `CNA`, `Capacity`) has been seen on it. Below that line any
/// letter-initial line with at least two numeric tokens and no "total" in
/// it counts.
pub fn relaxed_rows(text: &RecoveredText) -> Vec<RawRow> {
    let mut rows = Vec::new();
    for page in text.pages() {
        let mut under_header = false;
        for line in page {
            let line = line.as_text();
            let line = line.trim();

            if !under_header {
                under_header = contains_any(line, RELAXED_HEADER_KEYWORDS);
                continue;
            }
            if let Some(row) = relaxed_row(line) {
                rows.push(row);
            }
        }
    }
    rows
}

fn relaxed_row(line: &str) -> Option<RawRow> {
    if !starts_with_letter(line) || is_total_name(line) {
        return None;
    }

    let (name, tokens) = split_name_and_metrics(line)?;
    let numeric = tokens.iter().filter(|token| is_numeric_token(token)).count();
    (numeric >= 2).then(|| RawRow::new(name, tokens))
}
