//! Configuration management and validation.
//!
//! Provides the pipeline configuration, the validity oracle's acceptance
//! policy, and the structural limits applied to tables recovered from
//! legacy binary documents.

use crate::constants::{self, columns};
use crate::error::{CapacityError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Acceptance policy for recovered text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Minimum text length in characters
    pub min_length: usize,

    /// Maximum share of non-printable or non-ASCII characters
    pub max_noise_ratio: f64,

    /// Vendor stamps counted against the text
    pub vendor_markers: Vec<String>,

    /// Tolerated vendor stamp occurrences
    pub max_vendor_markers: usize,

    /// Any occurrence rejects the text
    pub corruption_signatures: Vec<String>,

    /// Any occurrence accepts otherwise-clean text
    pub domain_keywords: Vec<String>,

    /// Data-shaped lines that accept text with no keyword
    pub min_data_shaped_lines: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            min_length: constants::MIN_VALID_TEXT_LENGTH,
            max_noise_ratio: constants::MAX_NOISE_RATIO,
            vendor_markers: to_owned_list(constants::VENDOR_MARKERS),
            max_vendor_markers: constants::MAX_VENDOR_MARKERS,
            corruption_signatures: to_owned_list(constants::CORRUPTION_SIGNATURES),
            domain_keywords: to_owned_list(constants::DOMAIN_KEYWORDS),
            min_data_shaped_lines: constants::MIN_DATA_SHAPED_LINES,
        }
    }
}

/// Limits a legacy binary table must respect to be trusted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralLimits {
    pub min_rows: usize,
    pub min_fields: usize,
    pub max_fields: usize,
    pub max_value: f64,
}

impl Default for StructuralLimits {
    fn default() -> Self {
        Self {
            min_rows: constants::MIN_STRUCTURAL_ROWS,
            min_fields: constants::MIN_ROW_FIELDS,
            max_fields: constants::MAX_ROW_FIELDS,
            max_value: constants::MAX_CAPACITY_VALUE,
        }
    }
}

/// Main configuration for a corpus run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving per-file CSVs and the combined table
    pub output_dir: PathBuf,

    /// Combined table file name
    pub combined_file_name: String,

    /// Write `<stem>.csv` for every parsed file
    pub write_per_file_csv: bool,

    /// Columns removed from the master table
    pub column_denylist: Vec<String>,

    /// Seconds any external extractor may run before it is killed
    pub tool_timeout_secs: u64,

    /// Validity oracle policy
    pub oracle: OracleConfig,

    /// Legacy binary structural validator limits
    pub structural_limits: StructuralLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            combined_file_name: constants::COMBINED_FILE_NAME.to_string(),
            write_per_file_csv: true,
            column_denylist: to_owned_list(columns::DENYLIST),
            tool_timeout_secs: constants::EXTERNAL_TOOL_TIMEOUT_SECS,
            oracle: OracleConfig::default(),
            structural_limits: StructuralLimits::default(),
        }
    }
}

impl PipelineConfig {
    /// Create configuration with a custom output directory
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Create configuration with a custom combined file name
    pub fn with_combined_file_name(mut self, name: impl Into<String>) -> Self {
        self.combined_file_name = name.into();
        self
    }

    /// Skip writing one CSV per parsed input file
    pub fn without_per_file_csv(mut self) -> Self {
        self.write_per_file_csv = false;
        self
    }

    /// Set the external tool timeout
    pub fn with_tool_timeout_secs(mut self, secs: u64) -> Self {
        self.tool_timeout_secs = secs;
        self
    }

    /// Replace the oracle policy
    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the structural limits
    pub fn with_structural_limits(mut self, limits: StructuralLimits) -> Self {
        self.structural_limits = limits;
        self
    }

    /// External tool timeout as a duration
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Path of the combined master table
    pub fn combined_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.combined_file_name)
    }

    /// Check the configuration for values that would make every file fail
    pub fn validate(&self) -> Result<()> {
        if self.combined_file_name.trim().is_empty() {
            return Err(CapacityError::Configuration {
                message: "combined file name must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.oracle.max_noise_ratio) {
            return Err(CapacityError::Configuration {
                message: format!(
                    "noise ratio must be within [0, 1], got {}",
                    self.oracle.max_noise_ratio
                ),
            });
        }
        let limits = &self.structural_limits;
        if limits.min_fields > limits.max_fields {
            return Err(CapacityError::Configuration {
                message: format!(
                    "row field bounds are inverted: [{}, {}]",
                    limits.min_fields, limits.max_fields
                ),
            });
        }
        if self.tool_timeout_secs == 0 {
            return Err(CapacityError::Configuration {
                message: "tool timeout must be at least one second".to_string(),
            });
        }

        debug!("Configuration validated: {:?}", self);
        Ok(())
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
