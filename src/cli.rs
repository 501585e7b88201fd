//! Command-line argument definitions for the prison capacity extractor

use crate::config::PipelineConfig;
use crate::constants::EXTERNAL_TOOL_TIMEOUT_SECS;
use crate::error::{CapacityError, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Extract prison capacity tables from a directory of published reports
///
/// Reads every .ods, .rtf, .pdf, .doc and .docx file below the input
/// directory and combines the tables into one CSV.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "prison_capacity",
    version,
    about = "Extract prison capacity tables from ODS, RTF, PDF, DOC and DOCX reports into one CSV"
)]
pub struct Args {
    /// Directory containing the report files (searched recursively)
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory for per-file and combined CSVs
    ///
    /// Created if missing. Defaults to ./output
    #[arg(short = 'o', long = "output-dir", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Also write the monthly time series
    #[arg(long = "time-series", help = "Write monthly totals of the core capacity metrics")]
    pub time_series: bool,

    /// Month to leave out of the time series, as YYYY-MM (repeatable)
    #[arg(long = "exclude-month", value_name = "YYYY-MM", value_parser = parse_year_month)]
    pub exclude_months: Vec<String>,

    /// Print occupancy and overcrowding figures for the latest report
    #[arg(long = "summary")]
    pub summary: bool,

    /// Skip the per-file CSVs
    #[arg(long = "no-per-file")]
    pub no_per_file: bool,

    /// Timeout in seconds for external converters
    #[arg(long = "timeout", value_name = "SECS", default_value_t = EXTERNAL_TOOL_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

impl Args {
    /// Get the log level based on verbosity
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Build the pipeline configuration these arguments describe
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::default().with_tool_timeout_secs(self.timeout_secs);
        if let Some(output_dir) = &self.output_dir {
            config = config.with_output_dir(output_dir.clone());
        }
        if self.no_per_file {
            config = config.without_per_file_csv();
        }
        config.validate()?;
        Ok(config)
    }

    /// Check arguments that clap cannot
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            return Err(CapacityError::InputNotFound {
                path: self.input_dir.clone(),
            });
        }
        if !self.exclude_months.is_empty() && !self.time_series {
            return Err(CapacityError::Configuration {
                message: "--exclude-month requires --time-series".to_string(),
            });
        }
        Ok(())
    }
}

/// Accept `YYYY-MM` with a real month, zero-padded
fn parse_year_month(value: &str) -> std::result::Result<String, String> {
    let error = || format!("expected YYYY-MM, got '{}'", value);
    let date = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").map_err(|_| error())?;

    if date.format("%Y-%m").to_string() == value {
        Ok(value.to_string())
    } else {
        Err(error())
    }
}
