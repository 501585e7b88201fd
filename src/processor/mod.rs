//! Corpus combining engine.
//!
//! Orchestrates the complete report processing workflow: file discovery,
//! per-file parsing, report date fallback, per-file CSV output and the
//! combined master table.

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{
    discovery::FileDiscovery,
    writer::{TableWriter, table_to_frame},
};

use crate::config::PipelineConfig;
use crate::constants::columns;
use crate::date_resolver::file_modified_date;
use crate::error::{CapacityError, Result};
use crate::models::{ParsedTable, ProcessingStats, RawDocument};
use crate::parser::DocumentParser;
use crate::recovery::Capabilities;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome for a single file
enum FileOutcome {
    Parsed(DataFrame),
    Skipped(String),
}

/// Main processor turning a report directory into the master table
#[derive(Debug)]
pub struct CorpusCombiner {
    input_dir: PathBuf,
    config: PipelineConfig,
    capabilities: Capabilities,
    file_discovery: FileDiscovery,
    parser: DocumentParser,
    writer: TableWriter,
    master: Option<DataFrame>,
}

impl CorpusCombiner {
    /// Create a new combiner; host tools are probed once here
    pub fn new(input_dir: PathBuf, output_dir: Option<PathBuf>) -> Result<Self> {
        Self::with_capabilities(input_dir, output_dir, Capabilities::probe())
    }

    /// Create a combiner with an explicit capability set
    pub fn with_capabilities(
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        capabilities: Capabilities,
    ) -> Result<Self> {
        if !input_dir.exists() {
            return Err(CapacityError::InputNotFound { path: input_dir });
        }

        let mut config = PipelineConfig::default();
        if let Some(output_dir) = output_dir {
            config = config.with_output_dir(output_dir);
        }

        Self::build(input_dir, config, capabilities)
    }

    /// Configure the combiner
    pub fn with_config(self, config: PipelineConfig) -> Result<Self> {
        Self::build(self.input_dir, config, self.capabilities)
    }

    fn build(input_dir: PathBuf, config: PipelineConfig, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;
        debug!("Host capabilities: {}", capabilities.summary());

        Ok(Self {
            file_discovery: FileDiscovery::new(input_dir.clone()),
            parser: DocumentParser::new(&config, capabilities.clone())?,
            writer: TableWriter::new(config.output_dir.clone(), config.column_denylist.clone()),
            input_dir,
            config,
            capabilities,
            master: None,
        })
    }

    /// Master table from the last successful run
    pub fn master_table(&self) -> Option<&DataFrame> {
        self.master.as_ref()
    }

    /// Build the master table and return it
    pub fn combine(&mut self) -> Result<DataFrame> {
        self.process()?;
        self.master.clone().ok_or_else(|| CapacityError::CorpusEmpty {
            path: self.input_dir.clone(),
            files_seen: 0,
        })
    }

    /// Main processing entry point
    pub fn process(&mut self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let output_path = self.config.combined_output_path();

        println!("{}", "Starting prison capacity extraction".bright_green().bold());
        println!("  {} {}", "Input:".bright_cyan(), self.input_dir.display());
        println!("  {} {}", "Output:".bright_cyan(), output_path.display());

        // Step 1: Discover report files
        println!("\n{}", "Discovering report files...".bright_yellow());
        let files = self.file_discovery.discover_report_files()?;
        println!(
            "  {} {} report files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        );

        let mut stats = ProcessingStats {
            files_discovered: files.len(),
            files_skipped: self.file_discovery.temp_files_skipped(),
            output_path: output_path.clone(),
            ..Default::default()
        };

        // Step 2: Parse every file; a failing file never aborts the run
        println!("\n{}", "Processing files...".bright_yellow());
        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut frames = Vec::new();
        for path in &files {
            let file_name = display_name(path);
            progress.set_message(format!("Processing: {}", file_name));

            match self.process_file(path) {
                Ok(FileOutcome::Parsed(frame)) => {
                    info!("Successfully processed {} - {} rows", file_name, frame.height());
                    stats.files_processed += 1;
                    frames.push(frame);
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    info!("Skipping {} - {}", file_name, reason);
                    stats.files_skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", file_name, e);
                    stats.files_failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_with_message("All report files processed");

        if frames.is_empty() {
            return Err(CapacityError::CorpusEmpty {
                path: self.input_dir.clone(),
                files_seen: files.len(),
            });
        }

        // Step 3: Combine and persist
        println!("\n{}", "Building combined table...".bright_yellow());
        let mut master = self.writer.build_master(frames)?;
        self.writer
            .write_master(&mut master, &self.config.combined_file_name)?;
        stats.total_rows = master.height();
        self.master = Some(master);

        stats.processing_time_ms = start_time.elapsed().as_millis();
        print_summary(&stats);
        Ok(stats)
    }

    fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let Some(document) = RawDocument::open(path)? else {
            return Err(CapacityError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        };

        let result = self.parser.parse_document(&document);
        let mut table = result.table;
        if table.is_empty() {
            let reason = match result.stats.rejection {
                Some(rejection) => format!("table rejected: {}", rejection),
                None => "doesn't appear to contain valid prison data".to_string(),
            };
            return Ok(FileOutcome::Skipped(reason));
        }

        self.fill_report_date(path, &mut table);

        let frame = table_to_frame(&table)?;
        if frame.column(columns::PRISON_NAME).is_err() {
            return Ok(FileOutcome::Skipped("no prison name column".to_string()));
        }

        if self.config.write_per_file_csv {
            self.writer.write_per_file(path, &self.input_dir, &frame)?;
        }
        Ok(FileOutcome::Parsed(frame))
    }

    /// File-name rules first, then modification time
    fn fill_report_date(&self, path: &Path, table: &mut ParsedTable) {
        if table.report_date.is_some() {
            return;
        }

        let file_name = display_name(path);
        if let Some(date) = self.parser.dates().resolve(None, &file_name) {
            table.set_report_date(date);
            return;
        }

        match file_modified_date(path) {
            Some(date) => {
                warn!(
                    "Couldn't determine report date for {}. Using file modification time {} as fallback.",
                    file_name, date
                );
                table.set_report_date(date);
            }
            None => warn!("No report date available for {}", file_name),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {} of {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white(),
        stats.files_discovered
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} {}",
            "Files skipped:".bright_yellow(),
            stats.files_skipped.to_string().bright_yellow()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Saved to:".bright_cyan(),
        stats.output_path.display()
    );
}
