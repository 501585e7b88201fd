//! Prison Capacity Library
//!
//! Extracts prison capacity and population tables from published reports
//! in mixed document formats and combines them into one tidy CSV.
//!
//! This library provides tools for:
//! - Recovering text from ODS, RTF, PDF, DOCX and legacy binary DOC files
//! - Rejecting recovered text that is binary noise rather than report content
//! - Parsing capacity tables with one header/data/footer state machine
//! - Resolving report dates from content and file names
//! - Combining per-file tables into a deduplicated master CSV
//! - Monthly time series and occupancy analysis over the combined table

pub mod cli;
pub mod config;
pub mod constants;
pub mod date_resolver;
pub mod error;
pub mod models;
pub mod oracle;
pub mod parser;
pub mod processor;
pub mod recovery;
pub mod timeseries;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{CapacityError, Result};
pub use models::{DocumentFormat, Metric, ParsedTable, ProcessingStats, RawDocument, TableRecord};
pub use processor::CorpusCombiner;
pub use timeseries::CapacitySummary;
