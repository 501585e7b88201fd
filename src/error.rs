//! Error handling for prison capacity extraction.
//!
//! Most per-file problems are recovered locally and logged; only the
//! variants below ever reach a caller. `CorpusEmpty` is the single
//! run-level failure the combiner raises.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapacityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Input directory not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported document format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Text recovery failed for file: {path} - {reason}")]
    RecoveryFailed { path: PathBuf, reason: String },

    #[error("Recovered content rejected for file: {path} - {reason}")]
    ValidationRejected { path: PathBuf, reason: String },

    #[error("External tool '{tool}' failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    #[error("No usable prison data found under {path} ({files_seen} files examined)")]
    CorpusEmpty { path: PathBuf, files_seen: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, CapacityError>;
